//! Solidity interfaces consumed by the client.
//!
//! `IBaseFlow` is the order-management contract (its logic lives
//! on-chain, only the interface is known here). `IERC20` covers the
//! approval/allowance/balance calls made against sell tokens.
//! Calls are encoded with `SolCall::abi_encode` and results decoded
//! with `SolCall::abi_decode_returns`.

use alloy::sol;

sol! {
    interface IBaseFlow {
        // ── Views ──
        function swapFee() external view returns (uint256);
        function automationFee() external view returns (uint256);
        function getDexRouters() external view returns (address[]);
        function isDexRouter(address router) external view returns (bool);
        function collectedFeesETH() external view returns (uint256);
        function collectedFeesToken(address token) external view returns (uint256);

        function dcaOrders(uint256 orderId) external view returns (
            address user,
            address tokenIn,
            address tokenOut,
            uint256 amountPerInterval,
            uint256 intervalsRemaining,
            uint256 intervalDuration,
            uint256 lastExecutionTime,
            bool active
        );
        function limitOrders(uint256 orderId) external view returns (
            address user,
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 targetPrice,
            uint256 minAmountOut,
            uint256 expiry,
            bool active
        );
        function stopLossOrders(uint256 orderId) external view returns (
            address user,
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 stopPrice,
            uint256 minAmountOut,
            uint256 expiry,
            bool active
        );

        function getUserDCAOrders(address user) external view returns (uint256[]);
        function getUserLimitOrders(address user) external view returns (uint256[]);
        function getUserStopLossOrders(address user) external view returns (uint256[]);

        // ── Writes ──
        function swap(
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 minAmountOut,
            address dexRouter,
            bytes swapData
        ) external payable returns (uint256);

        function createDCAOrder(
            address tokenIn,
            address tokenOut,
            uint256 totalAmount,
            uint256 intervals,
            uint256 intervalDuration
        ) external payable returns (uint256);
        function cancelDCAOrder(uint256 orderId) external;

        function createLimitOrder(
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 targetPrice,
            uint256 minAmountOut,
            uint256 duration
        ) external payable returns (uint256);
        function cancelLimitOrder(uint256 orderId) external;

        function createStopLossOrder(
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 stopPrice,
            uint256 minAmountOut,
            uint256 duration
        ) external payable returns (uint256);
        function cancelStopLossOrder(uint256 orderId) external;

        // ── Events ──
        event Swap(address indexed user, address indexed tokenIn, address indexed tokenOut, uint256 amountIn, uint256 amountOut);
        event DCAOrderCreated(uint256 indexed orderId, address indexed user);
        event DCAOrderCancelled(uint256 indexed orderId);
        event LimitOrderCreated(uint256 indexed orderId, address indexed user);
        event LimitOrderCancelled(uint256 indexed orderId);
    }
}

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::{SolCall, SolValue};

    #[test]
    fn test_approve_selector() {
        let data = IERC20::approveCall {
            spender: Address::ZERO,
            amount: U256::from(1u64),
        }
        .abi_encode();
        // keccak256("approve(address,uint256)")[..4]
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_decode_order_ids() {
        let encoded = vec![U256::from(3u64), U256::from(7u64)].abi_encode();
        let decoded = IBaseFlow::getUserDCAOrdersCall::abi_decode_returns(&encoded, true)
            .unwrap()
            ._0;
        assert_eq!(decoded, vec![U256::from(3u64), U256::from(7u64)]);
    }
}
