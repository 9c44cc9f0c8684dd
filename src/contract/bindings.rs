//! Typed bindings for the vault contract functions
//!
//! Events are not bound here: their parameter lists vary between
//! deployments, so they are declared in configuration (see [`super::events`]).

use ethers::contract::abigen;

abigen!(
    AgentVault,
    r#"[
        function getAgentInfo(address _agent) external view returns (string name, uint256 remainingBudget, uint256 nextAllowedTxTime, bool active)
        function isPaused() external view returns (bool)
        function whitelistedMerchants(address) external view returns (bool)
        function togglePause() external
        function configureAgent(address _agent, string _name, uint256 _dailyLimit, uint256 _cooldown) external
        function addMerchant(address _merchant, string _label) external
    ]"#
);
