//! Contract event declarations and log decoding

use ethers::abi::{parse_abi, Event, RawLog, Token};
use ethers::types::{Address, Log, H256};
use tracing::debug;

use crate::config::EventsConfig;
use crate::error::{Error, Result};

/// Argument every tracked event must carry
pub const AGENT_ARG: &str = "agent";

/// Events the dashboard reads back from the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AgentConfigured,
    AgentRun,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::AgentConfigured, EventKind::AgentRun];

    /// Solidity event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::AgentConfigured => "AgentConfigured",
            EventKind::AgentRun => "AgentRun",
        }
    }

    /// History label
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::AgentConfigured => "Configuration Updated",
            EventKind::AgentRun => "Payment Executed",
        }
    }

    pub fn is_payment(&self) -> bool {
        matches!(self, EventKind::AgentRun)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A decoded contract log
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub kind: EventKind,
    pub tx_hash: H256,
    pub block_number: u64,
    /// Named arguments in declaration order
    pub args: Vec<(String, Token)>,
}

impl DecodedEvent {
    /// The `agent` argument, if it decoded as an address
    pub fn agent(&self) -> Option<Address> {
        self.args.iter().find_map(|(name, value)| match value {
            Token::Address(addr) if name == AGENT_ARG => Some(*addr),
            _ => None,
        })
    }

    pub fn arg(&self, name: &str) -> Option<&Token> {
        self.args
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

/// Parsed ABI for the tracked events
#[derive(Debug, Clone)]
pub struct EventSet {
    configured: Event,
    run: Event,
}

impl EventSet {
    /// Parse the human-readable declarations from configuration
    pub fn from_config(config: &EventsConfig) -> Result<Self> {
        Ok(Self {
            configured: parse_event(&config.agent_configured, EventKind::AgentConfigured)?,
            run: parse_event(&config.agent_run, EventKind::AgentRun)?,
        })
    }

    pub fn event(&self, kind: EventKind) -> &Event {
        match kind {
            EventKind::AgentConfigured => &self.configured,
            EventKind::AgentRun => &self.run,
        }
    }

    /// topic0 of the event
    pub fn topic(&self, kind: EventKind) -> H256 {
        self.event(kind).signature()
    }

    /// Decode a raw log as the given event
    pub fn decode(&self, kind: EventKind, log: &Log) -> Result<DecodedEvent> {
        let event = self.event(kind);
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };

        let parsed = event
            .parse_log(raw)
            .map_err(|e| Error::EventDecode(format!("{}: {}", kind, e)))?;

        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| Error::EventDecode(format!("{} log without transaction hash", kind)))?;

        // Pending logs carry no block; they sort last
        let block_number = log.block_number.map(|n| n.as_u64()).unwrap_or(0);

        debug!("Decoded {} at block {} ({:?})", kind, block_number, tx_hash);

        Ok(DecodedEvent {
            kind,
            tx_hash,
            block_number,
            args: parsed
                .params
                .into_iter()
                .map(|param| (param.name, param.value))
                .collect(),
        })
    }
}

fn parse_event(declaration: &str, kind: EventKind) -> Result<Event> {
    let abi = parse_abi(&[declaration])
        .map_err(|e| Error::Config(format!("Invalid {} declaration: {}", kind, e)))?;

    let event = abi
        .events()
        .next()
        .cloned()
        .ok_or_else(|| Error::Config(format!("{} declaration is not an event", kind)))?;

    if event.name != kind.name() {
        return Err(Error::Config(format!(
            "Expected event {}, got {}",
            kind.name(),
            event.name
        )));
    }

    if !event
        .inputs
        .iter()
        .any(|input| input.name == AGENT_ARG && input.kind == ethers::abi::ParamType::Address)
    {
        return Err(Error::Config(format!(
            "{} must declare an `address {}` argument",
            kind, AGENT_ARG
        )));
    }

    Ok(event)
}
