use proptest::prelude::*;
use strata_blocks::{Block, BlockRegistry};

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

proptest! {
    // Ids assigned in declaration order; by_name agrees with the table
    #[test]
    fn ids_are_contiguous_and_named(names in proptest::collection::hash_set(ident(), 1..12)) {
        let mut names: Vec<String> = names.into_iter().filter(|n| n != "air").collect();
        names.insert(0, "air".to_string());
        let mut toml = String::new();
        for name in &names {
            toml.push_str(&format!("[[blocks]]\nname = \"{name}\"\nsolid = false\n"));
        }
        let reg = BlockRegistry::from_toml_str(&toml).unwrap();
        prop_assert_eq!(reg.blocks.len(), names.len());
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(reg.id_by_name(name), Some(i as u16));
            prop_assert_eq!(&reg.blocks[i].name, name);
        }
    }

    // Unknown ids never panic and read as inert
    #[test]
    fn unknown_ids_are_inert(id in 0u16..u16::MAX) {
        let reg = BlockRegistry::builtin();
        let b = Block::new(id);
        if reg.get(id).is_none() {
            prop_assert!(!reg.is_solid(b));
            prop_assert_eq!(reg.opacity(b), 0);
            prop_assert_eq!(reg.emission(b), 0);
            prop_assert!(!reg.has_tile_entity(b));
        }
    }

    // Opacity default tracks solidity
    #[test]
    fn opacity_default_tracks_solidity(solid in any::<bool>()) {
        let toml = format!(
            "[[blocks]]\nname = \"air\"\nsolid = false\n[[blocks]]\nname = \"x\"\nsolid = {solid}\n"
        );
        let reg = BlockRegistry::from_toml_str(&toml).unwrap();
        let x = reg.block("x");
        prop_assert_eq!(reg.opacity(x), if solid { 15 } else { 0 });
    }
}
