//! Binary snapshot of a content pack, sent to peers that join after load.
//!
//! ```text
//! [varint stat count]   [stat]*          serde layout of StatType
//! [varint recipe count] [u32 len][recipe]*
//! ```
//!
//! Each recipe is framed by its byte length so a receiver can bound the read
//! and report which entry was malformed.

use std::sync::Arc;

use loader_core::{Result, WireReader, WireWriter};

use crate::pack::{ContentCodecs, ContentPack};
use crate::recipes::Recipe;
use crate::stats::{StatType, build_stat_registry};

pub struct ContentSnapshot;

impl ContentSnapshot {
    pub fn encode(pack: &ContentPack) -> Result<Vec<u8>> {
        let mut writer = WireWriter::new();

        writer.write_var_u64(pack.stats().len() as u64)?;
        for stat in pack.stats().values() {
            writer.write_serde(stat.as_ref())?;
        }

        let codec = pack.codecs().recipe();
        writer.write_var_u64(pack.recipes().len() as u64)?;
        for recipe in pack.recipes().values().map(Arc::as_ref) {
            let mut entry = WireWriter::new();
            codec
                .encode(&mut entry, recipe)
                .map_err(|e| e.in_field(recipe.id.to_string()))?;
            writer.write_frame(entry.as_bytes())?;
        }

        Ok(writer.into_bytes())
    }

    /// Rebuilds a pack from `bytes`, which must be consumed exactly.
    pub fn decode(codecs: &ContentCodecs, bytes: &[u8]) -> Result<ContentPack> {
        let mut reader = WireReader::new(bytes);

        let stat_count = reader.read_var_u64()?;
        let mut stats = Vec::new();
        for index in 0..stat_count {
            let stat: StatType = reader
                .read_serde()
                .map_err(|e| e.in_field(index.to_string()).in_field("stats"))?;
            stats.push(stat);
        }

        let recipe_count = reader.read_var_u64()?;
        let mut recipes = Vec::new();
        for index in 0..recipe_count {
            let recipe = decode_entry(codecs, &mut reader)
                .map_err(|e| e.in_field(index.to_string()).in_field("recipes"))?;
            recipes.push(recipe);
        }
        reader.finish()?;

        ContentPack::assemble(codecs.clone(), build_stat_registry(stats)?, recipes)
    }
}

fn decode_entry(codecs: &ContentCodecs, reader: &mut WireReader<'_>) -> Result<Recipe> {
    let mut frame = reader.read_frame()?;
    let recipe = codecs.recipe().decode(&mut frame)?;
    frame.finish()?;
    Ok(recipe)
}
