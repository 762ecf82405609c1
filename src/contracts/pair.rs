//! Uniswap V2 pair; doubles as the LP token
use ethers::prelude::*;

abigen!(
    IUniswapV2Pair,
    r#"[
        function token0() external view returns (address)
        function token1() external view returns (address)
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function totalSupply() external view returns (uint)
        function balanceOf(address owner) external view returns (uint)
        function allowance(address owner, address spender) external view returns (uint)
        function approve(address spender, uint value) external returns (bool)
    ]"#,
);
