//! Human-readable ABIs for the contracts the client talks to

use ethers::abi::{parse_abi, Abi};
use lazy_static::lazy_static;

const ERC20_SIGNATURES: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address) view returns (uint256)",
    "function transfer(address to, uint256 amount) returns (bool)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function approve(address spender, uint256 amount) returns (bool)",
    "function transferFrom(address from, address to, uint256 amount) returns (bool)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
];

const ROUTER_SIGNATURES: &[&str] = &[
    "function factory() external pure returns (address)",
    "function WETH() external pure returns (address)",
    "function swapExactTokensForTokens(uint amountIn, uint amountOutMin, address[] path, address to, uint deadline) external returns (uint[] amounts)",
    "function swapExactETHForTokens(uint amountOutMin, address[] path, address to, uint deadline) external payable returns (uint[] amounts)",
    "function swapExactTokensForETH(uint amountIn, uint amountOutMin, address[] path, address to, uint deadline) external returns (uint[] amounts)",
    "function getAmountsOut(uint amountIn, address[] path) external view returns (uint[] amounts)",
    "function getAmountsIn(uint amountOut, address[] path) external view returns (uint[] amounts)",
];

const BRIDGE_SIGNATURES: &[&str] = &[
    "function anySwapOut(address token, address to, uint amount, uint toChainID) external",
    "function anySwapOutUnderlying(address token, address to, uint amount, uint toChainID) external",
];

lazy_static! {
    pub static ref ERC20_ABI: Abi = parse_abi(ERC20_SIGNATURES).unwrap_or_default();
    pub static ref ROUTER_ABI: Abi = parse_abi(ROUTER_SIGNATURES).unwrap_or_default();
    pub static ref BRIDGE_ABI: Abi = parse_abi(BRIDGE_SIGNATURES).unwrap_or_default();
}
