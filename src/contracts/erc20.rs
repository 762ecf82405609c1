//! Test token interface: ERC20 plus an open faucet `mint`
use ethers::prelude::*;

abigen!(
    ITempoToken,
    r#"[
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function decimals() external view returns (uint8)
        function symbol() external view returns (string)
        function name() external view returns (string)
        function mint(uint256 amount) external
    ]"#,
);
