use std::fs;
use std::path::Path;
use std::sync::Arc;

use loader_content::{
    ContentFactory, ContentSnapshot, Effect, EffectCodecs, FixedEffect, Recipe, ScalingEffect,
};
use loader_core::{InstanceIdentity, Key};
use serde_json::json;

const MANIFEST: &str = r#"
namespace = "content"
stats = "stats.ron"
recipes = ["recipes/baking.ron", "recipes/soups.json"]
strict = true
"#;

const STATS: &str = r#"[
    {"key": "stat:health", "max": 20.0, "default": 10.0},
    {"key": "stat:mana", "min": 0.0, "max": 8.0},
]"#;

const BAKING: &str = r#"[
    {
        "id": "content:bread",
        "ingredients": [{"item": "content:wheat", "count": 3}],
        "result": "content:bread",
        "cookingtime": 100,
        "experience": 0.5,
    },
    {
        "id": "content:pie",
        "ingredients": [{"item": "content:apple"}, {"item": "content:wheat"}],
        "result": "content:pie",
        "count": 2,
        "effect": "effect:none",
        "rewards": [{"chance": 0.25, "effect": "effect:fixed", "amount": 2}],
    },
]"#;

const SOUPS: &str = r#"{
    "id": "content:stew",
    "ingredients": [{"item": "content:carrot", "count": 2}],
    "result": "content:stew",
    "effect": {"type": "effect:scaling", "stat": "stat:health", "factor": 1.5}
}"#;

fn write_pack(dir: &Path, manifest: &str, soups: &str) {
    fs::create_dir_all(dir.join("recipes")).unwrap();
    fs::write(dir.join("content.toml"), manifest).unwrap();
    fs::write(dir.join("stats.ron"), STATS).unwrap();
    fs::write(dir.join("recipes/baking.ron"), BAKING).unwrap();
    fs::write(dir.join("recipes/soups.json"), soups).unwrap();
}

fn key(raw: &str) -> Key {
    Key::parse(raw).unwrap()
}

#[test]
fn loads_a_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_pack(dir.path(), MANIFEST, SOUPS);

    let pack = ContentFactory::new(dir.path()).load_pack().unwrap();
    assert_eq!(pack.stats().len(), 2);
    assert_eq!(pack.recipes().len(), 3);

    let bread = pack.recipe(&key("content:bread")).unwrap();
    assert_eq!(bread.cook_time, 100);
    assert_eq!(bread.experience, Some(0.5));
    assert!(bread.effect.same_instance(&Effect::none()));

    let pie = pack.recipe(&key("content:pie")).unwrap();
    assert!(pie.effect.same_instance(&Effect::none()));
    assert_eq!(pie.rewards[0].chance, 0.25);
    assert_eq!(pie.rewards[0].effect, Effect::new(FixedEffect { amount: 2 }));

    let stew = pack.recipe(&key("content:stew")).unwrap();
    assert_eq!(
        stew.effect,
        Effect::new(ScalingEffect {
            stat: key("stat:health"),
            factor: 1.5,
        })
    );
}

#[test]
fn written_documents_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    write_pack(dir.path(), MANIFEST, SOUPS);
    let pack = ContentFactory::new(dir.path()).load_pack().unwrap();

    let codec = pack.codecs().recipe();
    for recipe in pack.recipes().values().map(Arc::as_ref) {
        let doc = codec.write(recipe).unwrap();
        assert_eq!(&codec.read(&doc).unwrap(), recipe);
    }

    let pie: &Recipe = pack.recipe(&key("content:pie")).unwrap();
    let pie = codec.write(pie).unwrap();
    assert_eq!(
        pie,
        json!({
            "id": "content:pie",
            "ingredients": [{"item": "content:apple"}, {"item": "content:wheat"}],
            "result": "content:pie",
            "count": 2,
            "rewards": [{"chance": 0.25, "effect": "effect:fixed", "amount": 2}]
        })
    );
}

#[test]
fn snapshot_of_a_loaded_pack_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    write_pack(dir.path(), MANIFEST, SOUPS);
    let pack = ContentFactory::new(dir.path()).load_pack().unwrap();

    let bytes = ContentSnapshot::encode(&pack).unwrap();
    let copy = ContentSnapshot::decode(pack.codecs(), &bytes).unwrap();
    for recipe in pack.recipes().values() {
        assert_eq!(copy.recipe(&recipe.id), Some(recipe));
    }
    assert!(
        copy.recipe(&key("content:pie"))
            .unwrap()
            .effect
            .same_instance(&Effect::none())
    );
}

#[test]
fn strict_manifest_rejects_unknown_recipe_keys() {
    let dir = tempfile::tempdir().unwrap();
    let soups = r#"{"id": "content:stew", "ingredients": [], "result": "content:stew", "colour": "brown"}"#;
    write_pack(dir.path(), MANIFEST, soups);

    let err = ContentFactory::new(dir.path()).load_pack().err().unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("Invalid recipe document"));
    assert!(message.contains("unknown field 'colour'"));

    let lenient = MANIFEST.replace("strict = true", "strict = false");
    write_pack(dir.path(), &lenient, soups);
    assert!(ContentFactory::new(dir.path()).load_pack().is_ok());
}

#[test]
fn unknown_effect_variant_names_the_recipe_file() {
    let dir = tempfile::tempdir().unwrap();
    let soups = r#"{"id": "content:stew", "ingredients": [], "result": "content:stew", "effect": "effect:heal"}"#;
    write_pack(dir.path(), MANIFEST, soups);

    let err = ContentFactory::new(dir.path()).load_pack().err().unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("soups.json"));
    assert!(message.contains("unknown effect variant 'effect:heal'"));
}

#[test]
fn dangling_stat_reference_fails_the_pack() {
    let dir = tempfile::tempdir().unwrap();
    let soups = SOUPS.replace("stat:health", "stat:stamina");
    write_pack(dir.path(), MANIFEST, &soups);

    let err = ContentFactory::new(dir.path()).load_pack().err().unwrap();
    assert!(format!("{err:#}").contains("unregistered stat 'stat:stamina'"));
}

#[test]
fn recipes_outside_the_namespace_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let soups = SOUPS.replace("\"id\": \"content:stew\"", "\"id\": \"mymod:stew\"");
    write_pack(dir.path(), MANIFEST, &soups);

    let err = ContentFactory::new(dir.path()).load_pack().err().unwrap();
    assert!(err.to_string().contains("outside namespace 'content'"));
}

#[test]
fn extension_effects_are_accepted_when_registered() {
    use loader_content::NoEffect;
    use loader_core::{Loader, UnitVariant};

    let dir = tempfile::tempdir().unwrap();
    let soups = r#"{"id": "content:stew", "ingredients": [], "result": "content:stew", "effect": "mymod:calm"}"#;
    write_pack(dir.path(), MANIFEST, soups);

    assert!(ContentFactory::new(dir.path()).load_pack().is_err());

    let mut builder = EffectCodecs::builder().unwrap();
    builder
        .register(
            key("mymod:calm"),
            Loader::new(UnitVariant::new(|| Effect::new(NoEffect))),
        )
        .unwrap();
    let pack = ContentFactory::new(dir.path())
        .with_effects(EffectCodecs::from_builder(builder))
        .load_pack()
        .unwrap();
    assert_eq!(pack.recipes().len(), 3);
}
