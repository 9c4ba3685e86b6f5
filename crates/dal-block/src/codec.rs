//! Serialization and validated parsing of blocks.
//!
//! Parsing is a two-step process: the document is first inspected as untyped
//! JSON so every missing field can be reported by name, then decoded into a
//! typed [`Block`] and checked for payloads and position ranges.

use serde_json::{Map, Value};

use crate::block::{Block, BLOCK_VERSION};
use crate::error::{BlockError, BlockResult};

impl Block {
    /// Serialize to the persisted JSON layout.
    pub fn to_json(&self) -> BlockResult<String> {
        serde_json::to_string(self).map_err(|e| BlockError::Serialization(e.to_string()))
    }

    /// Parse a serialized block, checking that it follows the block layout.
    pub fn parse(data: &str) -> BlockResult<Block> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| BlockError::InvalidJson(e.to_string()))?;
        check_layout(&value)?;

        let block: Block =
            serde_json::from_value(value).map_err(|e| BlockError::Malformed(e.to_string()))?;

        if let Some(position) = block.transactions.iter().position(|tx| !tx.has_payload()) {
            return Err(BlockError::TransactionWithoutPayload { position });
        }

        let count = block.transactions.len();
        for (channel_id, positions) in &block.header.channel_ids {
            if let Some(&position) = positions.iter().find(|&&p| p >= count) {
                return Err(BlockError::PositionOutOfRange {
                    channel_id: channel_id.clone(),
                    position,
                    count,
                });
            }
        }

        Ok(block)
    }
}

fn check_layout(value: &Value) -> BlockResult<()> {
    let root = value
        .as_object()
        .ok_or_else(|| BlockError::Malformed("block is not a JSON object".into()))?;
    let header = required(root, "header", "header")?;
    required(root, "transactions", "transactions")?;

    let header = header
        .as_object()
        .ok_or_else(|| BlockError::Malformed("header is not a JSON object".into()))?;
    required(header, "channelIds", "header.channelIds")?;
    required(header, "topics", "header.topics")?;
    let version = required(header, "version", "header.version")?;

    match version.as_str() {
        Some(BLOCK_VERSION) => Ok(()),
        Some("") => Err(BlockError::MissingField("header.version")),
        _ => Err(BlockError::UnsupportedVersion(version.to_string())),
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> BlockResult<&'a Value> {
    match object.get(key) {
        None | Some(Value::Null) => Err(BlockError::MissingField(path)),
        Some(value) => Ok(value),
    }
}
