//! Reply correlation.
//!
//! Every command sent with a sequence number may register a pending entry
//! here. When `R<seq>|<result>|<data>` arrives the entry is removed and,
//! on success, the reply data is routed to the parser for the command that
//! produced it (`info`, `version`, `slice list`, ...). The optional
//! callback then runs exactly once, on success or failure.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use flexlib_core::{ModelEvent, ObjectKind, Result};

use crate::codec::{self, Reply, tokenize};
use crate::model::Model;

/// Completion callback for a pending command.
pub type ReplyCallback = Box<dyn FnOnce(&Reply) + Send>;

/// A command awaiting its reply.
pub struct ReplyTuple {
    pub command: String,
    pub callback: Option<ReplyCallback>,
}

impl fmt::Debug for ReplyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyTuple")
            .field("command", &self.command)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Describe a SmartSDR result code.
pub fn describe_error(code: u32) -> &'static str {
    match code {
        0x0000_0000 => "success",
        0x5000_0015 => "unknown command",
        0x5000_0016 => "malformed command",
        0x5000_002C => "incorrect number of parameters",
        0x5000_002D => "bad field",
        0x5000_003C => "object not found",
        0x5000_0060 => "invalid slice receiver",
        0x5000_0061 => "invalid panadapter",
        0x5000_00A3 => "subscription not found",
        _ => "unrecognized error code",
    }
}

/// Pending replies keyed by command sequence number.
#[derive(Debug, Default)]
pub struct ReplyCorrelator {
    pending: Mutex<HashMap<u32, ReplyTuple>>,
}

impl ReplyCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command`, sent as sequence `seq`. A second registration
    /// for the same sequence replaces the first.
    pub fn add_reply_handler(&self, seq: u32, command: &str, callback: Option<ReplyCallback>) {
        let tuple = ReplyTuple {
            command: command.to_string(),
            callback,
        };
        self.lock().insert(seq, tuple);
    }

    /// Abandon a pending command without running its callback.
    pub fn remove(&self, seq: u32) -> Option<ReplyTuple> {
        self.lock().remove(&seq)
    }

    /// Abandon every pending command. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut pending = self.lock();
        let n = pending.len();
        pending.clear();
        n
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    pub fn is_pending(&self, seq: u32) -> bool {
        self.lock().contains_key(&seq)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, ReplyTuple>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Parse a reply body (`<seq>|<result>|<data>`, no leading `R`) and
    /// handle it.
    pub fn parse_reply(&self, model: &Model, body: &str) -> Result<()> {
        let reply = codec::parse_reply(body)?;
        self.handle_reply(model, &reply);
        Ok(())
    }

    /// Handle a decoded reply. Returns `false` when nothing was pending for
    /// its sequence number.
    pub fn handle_reply(&self, model: &Model, reply: &Reply) -> bool {
        // The callback runs outside the table lock.
        let Some(tuple) = self.remove(reply.sequence) else {
            tracing::trace!(seq = reply.sequence, "Reply with no pending command");
            return false;
        };

        if reply.is_ok() {
            apply_reply_data(model, &tuple.command, &reply.data);
        } else {
            tracing::warn!(
                seq = reply.sequence,
                command = %tuple.command,
                code = format!("0x{:08X}", reply.result),
                error = describe_error(reply.result),
                data = %reply.data,
                "Command failed"
            );
        }

        if let Some(callback) = tuple.callback {
            callback(reply);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------------------

/// Route successful reply data by the command that produced it.
fn apply_reply_data(model: &Model, command: &str, data: &str) {
    let command = command.trim();
    if command == "info" {
        parse_info(model, data);
    } else if command == "version" {
        parse_version(model, data);
    } else if command == "slice list" {
        let ids: Vec<u16> = data
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        model.radio.write(|r| r.get_mut().slice_list = ids);
        radio_updated(model);
    } else if command == "ant list" {
        let list = codec::split_list(data, ',');
        model.radio.write(|r| r.get_mut().antenna_list = list);
        radio_updated(model);
    } else if command == "mic list" {
        let list = codec::split_list(data, ',');
        model.radio.write(|r| r.get_mut().mic_list = list);
        radio_updated(model);
    } else if command == "radio uptime" {
        let raw = data.rsplit('=').next().unwrap_or_default().trim();
        match raw.parse::<u64>() {
            Ok(secs) => {
                model.radio.write(|r| r.get_mut().uptime = secs);
                radio_updated(model);
            }
            Err(_) => tracing::warn!(data = %data, "Unparsable uptime reply"),
        }
    } else if command.starts_with("wan validate") {
        model.apply_single(&model.wan, &tokenize(data, ' '));
    }
}

fn radio_updated(model: &Model) {
    model.emit(ModelEvent::Updated {
        kind: ObjectKind::Radio,
        id: String::new(),
    });
}

/// `model="FLEX-6600",chassis_serial="1234",name="Shack",...`
fn parse_info(model: &Model, data: &str) {
    let pairs: Vec<(&str, &str)> = tokenize(data, ',')
        .into_iter()
        .map(|(k, v)| (k, v.trim_matches('"')))
        .collect();
    model.apply_single(&model.radio, &pairs);
}

/// `SmartSDR-MB=3.4.5.123#PSoC-MBTRX=1.0.2#FPGA-MB=2.1.0`
fn parse_version(model: &Model, data: &str) {
    let versions = tokenize(data, '#')
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()));
    model.radio.write(|r| r.get_mut().versions.extend(versions));
    radio_updated(model);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
