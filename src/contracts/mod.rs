//! TempoDEX contract interfaces
//!
//! The router, factory and pair contracts are a Uniswap V2 deployment; the
//! test tokens are plain ERC20s with an open `mint`. These bindings are the
//! only place the ABIs appear.
pub mod erc20;
pub mod factory;
pub mod pair;
pub mod router;

pub use erc20::ITempoToken;
pub use factory::IUniswapV2Factory;
pub use pair::IUniswapV2Pair;
pub use router::IUniswapV2Router02;

/// 4-byte function selectors seen in wallet history
pub mod selectors {
    pub const SWAP_EXACT_TOKENS_FOR_TOKENS: [u8; 4] = [0x38, 0xed, 0x17, 0x39];
    pub const SWAP_EXACT_TOKENS_FOR_ETH: [u8; 4] = [0x18, 0xcb, 0xaf, 0xe5];
    pub const ADD_LIQUIDITY: [u8; 4] = [0xe8, 0xe3, 0x37, 0x00];
    pub const REMOVE_LIQUIDITY: [u8; 4] = [0xba, 0xa2, 0xab, 0xde];
    pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
    pub const MINT_TO: [u8; 4] = [0x40, 0xc1, 0x0f, 0x19];
    pub const MINT: [u8; 4] = [0xa0, 0x71, 0x2d, 0x68];
}
