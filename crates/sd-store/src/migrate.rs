//! Versioned persisted schema.
//!
//! Persisted form: `{"version": 1, "user": { ..document.. }}`. Payloads
//! without a version are legacy (v0) documents, stored either bare or under
//! `user`. Every load also drops or resets fields of the wrong shape, so one
//! bad entry never costs the rest of the document.

use crate::document::{DEFAULT_DEADLINE_FROM_NOW, PreferenceDocument};
use anyhow::{Context, Result, bail};
use sd_types::{Locale, PairRecord, TokenRecord, WalletId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

pub const SCHEMA_VERSION: u64 = 1;

const SLIPPAGE_MIGRATION_FLAG: &str = "userSlippageToleranceHasBeenMigratedToAuto";
const LEGACY_SLIPPAGE_PRESETS: [u64; 3] = [10, 50, 100];

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    user: &'a PreferenceDocument,
}

#[derive(Debug)]
pub struct Rehydrated {
    pub document: PreferenceDocument,
    pub from_version: u64,
}

impl Rehydrated {
    pub fn was_migrated(&self) -> bool {
        self.from_version != SCHEMA_VERSION
    }
}

pub fn encode(doc: &PreferenceDocument) -> Result<String> {
    let raw = serde_json::to_string(&Envelope {
        version: SCHEMA_VERSION,
        user: doc,
    })?;
    Ok(raw)
}

pub fn decode(raw: &str) -> Result<Rehydrated> {
    let value: Value = serde_json::from_str(raw).context("persisted preferences are not valid JSON")?;
    let from_version = value.get("version").and_then(Value::as_u64).unwrap_or(0);

    if from_version > SCHEMA_VERSION {
        bail!("persisted preferences use schema v{from_version}, newer than v{SCHEMA_VERSION}");
    }

    let mut user = if from_version == 0 {
        migrate_legacy(value)
    } else {
        match value {
            Value::Object(mut envelope) => envelope
                .remove("user")
                .context("persisted envelope has no `user` document")?,
            _ => bail!("persisted envelope is not an object"),
        }
    };

    let Value::Object(fields) = &mut user else {
        bail!("persisted preference document is not an object");
    };
    sanitize(fields);

    let document = serde_json::from_value(user)
        .context("persisted preference document does not match the schema")?;

    Ok(Rehydrated {
        document,
        from_version,
    })
}

fn migrate_legacy(value: Value) -> Value {
    let mut user = match value {
        Value::Object(mut root) => match root.remove("user") {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                root.insert("user".to_owned(), other);
                Value::Object(root)
            }
            None => Value::Object(root),
        },
        other => other,
    };

    if let Value::Object(fields) = &mut user {
        // older builds dispatched `{ wallet }` records instead of the bare id
        if let Some(Value::Object(record)) = fields.get("selectedWallet") {
            let wallet = record.get("wallet").cloned().unwrap_or(Value::Null);
            fields.insert("selectedWallet".to_owned(), wallet);
        }

        let migrated_to_auto = fields
            .get(SLIPPAGE_MIGRATION_FLAG)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let is_old_preset = fields
            .get("userSlippageTolerance")
            .and_then(Value::as_u64)
            .is_some_and(|bips| LEGACY_SLIPPAGE_PRESETS.contains(&bips));
        if !migrated_to_auto && is_old_preset {
            fields.insert("userSlippageTolerance".to_owned(), Value::from("auto"));
        }
    }

    user
}

fn sanitize(fields: &mut Map<String, Value>) {
    fields.remove(SLIPPAGE_MIGRATION_FLAG);

    if let Some(value) = fields.get("userSlippageTolerance") {
        let valid = value.as_str() == Some("auto")
            || value
                .as_u64()
                .is_some_and(|bips| u32::try_from(bips).is_ok());
        if !valid {
            fields.insert("userSlippageTolerance".to_owned(), Value::from("auto"));
        }
    }

    if let Some(value) = fields.get("userDeadline") {
        if value.as_u64().is_none() {
            fields.insert("userDeadline".to_owned(), Value::from(DEFAULT_DEADLINE_FROM_NOW));
        }
    }

    if let Some(value) = fields.get("userLocale") {
        let valid = value.is_null() || value.as_str().is_some_and(Locale::is_supported);
        if !valid {
            fields.insert("userLocale".to_owned(), Value::Null);
        }
    }

    if let Some(value) = fields.get("selectedWallet") {
        let valid = value.is_null()
            || value
                .as_str()
                .is_some_and(|id| id.parse::<WalletId>().is_ok());
        if !valid {
            fields.remove("selectedWallet");
        }
    }

    retain_records::<TokenRecord>(fields, "tokens");
    retain_records::<PairRecord>(fields, "pairs");
}

/// Keep only the `chain -> id -> record` entries that decode as `T`.
fn retain_records<T: DeserializeOwned>(fields: &mut Map<String, Value>, field: &str) {
    if !fields.get(field).is_some_and(Value::is_object) {
        if fields.remove(field).is_some() {
            warn!(field, "dropping malformed record map");
        }
        return;
    }
    let Some(chains) = fields.get_mut(field).and_then(Value::as_object_mut) else {
        return;
    };

    chains.retain(|chain, records| {
        let records = match records.as_object_mut() {
            Some(records) if chain.parse::<u64>().is_ok() => records,
            _ => {
                warn!(field, %chain, "dropping malformed chain entry");
                return false;
            }
        };
        records.retain(|id, record| {
            let valid = T::deserialize(&*record).is_ok();
            if !valid {
                warn!(field, %chain, %id, "dropping malformed record");
            }
            valid
        });
        true
    });
}
