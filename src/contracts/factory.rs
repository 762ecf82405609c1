//! Uniswap V2 factory, used for pair discovery
use ethers::prelude::*;

abigen!(
    IUniswapV2Factory,
    r#"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
        function allPairs(uint index) external view returns (address pair)
        function allPairsLength() external view returns (uint)
    ]"#,
);
