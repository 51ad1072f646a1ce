//! Round-trip verification of a loaded content pack.

use std::sync::Arc;

use anyhow::{Context, Result};
use loader_content::{ContentPack, ContentSnapshot};
use loader_core::{WireReader, WireWriter};
use tracing::debug;

use crate::config::CheckConfig;

/// Totals gathered while checking a pack.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub recipes: usize,
    pub snapshot_bytes: usize,
}

/// Writes every recipe back out and reads it again, in the document form and
/// (unless disabled) the wire form, failing on the first value that changes.
pub fn verify(pack: &ContentPack, config: &CheckConfig) -> Result<CheckReport> {
    let codec = pack.codecs().recipe();
    let mut report = CheckReport::default();

    for recipe in pack.recipes().values().map(Arc::as_ref) {
        let doc = codec
            .write(recipe)
            .with_context(|| format!("Failed to write recipe '{}'", recipe.id))?;
        if config.dump {
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        let reread = codec
            .read(&doc)
            .with_context(|| format!("Failed to re-read recipe '{}'", recipe.id))?;
        anyhow::ensure!(
            &reread == recipe,
            "recipe '{}' changed across a document round trip",
            recipe.id
        );

        if config.verify_wire {
            let mut writer = WireWriter::new();
            codec.encode(&mut writer, recipe)?;
            let bytes = writer.into_bytes();
            let mut reader = WireReader::new(&bytes);
            let decoded = codec
                .decode(&mut reader)
                .with_context(|| format!("Failed to decode recipe '{}'", recipe.id))?;
            reader.finish()?;
            anyhow::ensure!(
                &decoded == recipe,
                "recipe '{}' changed across a wire round trip",
                recipe.id
            );
            debug!(target: "loader::content", id = %recipe.id, bytes = bytes.len(), "wire ok");
        }

        report.recipes += 1;
    }

    if config.verify_wire {
        let bytes = ContentSnapshot::encode(pack)?;
        let copy = ContentSnapshot::decode(pack.codecs(), &bytes)?;
        anyhow::ensure!(
            copy.recipes().len() == pack.recipes().len(),
            "snapshot lost recipes"
        );
        report.snapshot_bytes = bytes.len();
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use loader_content::{ContentCodecs, build_stat_registry};
    use serde_json::json;

    use super::*;

    fn pack() -> ContentPack {
        let codecs = ContentCodecs::new(true).unwrap();
        let recipes = codecs
            .read_recipes(&json!({
                "id": "content:bread",
                "ingredients": [{"item": "content:wheat", "count": 3}],
                "result": "content:bread",
                "rewards": [{"effect": "effect:fixed", "amount": 1}]
            }))
            .unwrap();
        ContentPack::assemble(codecs, build_stat_registry([]).unwrap(), recipes).unwrap()
    }

    #[test]
    fn verifies_both_forms() {
        let report = verify(&pack(), &CheckConfig::default()).unwrap();
        assert_eq!(report.recipes, 1);
        assert!(report.snapshot_bytes > 0);
    }

    #[test]
    fn wire_check_can_be_skipped() {
        let config = CheckConfig {
            verify_wire: false,
            ..CheckConfig::default()
        };
        let report = verify(&pack(), &config).unwrap();
        assert_eq!(report.snapshot_bytes, 0);
    }
}
