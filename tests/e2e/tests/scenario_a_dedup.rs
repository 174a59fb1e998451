//! Spec §8 scenario A / testable property 1: two episodes that both mention
//! "Alice" must dedup her into a single entity node, while still producing
//! one entity per distinct name and one Mentions edge per resolved mention.

use graphzep_core::adapters::language::{ExtractedEntity, ExtractedFacts, ExtractedRelation};
use graphzep_core::memory_manager::AddMemoryParams;
use graphzep_e2e_tests::harness::scripted_engine;

fn entity(name: &str, entity_type: &str) -> ExtractedEntity {
    ExtractedEntity { name: name.to_string(), entity_type: entity_type.to_string(), summary: String::new() }
}

fn relation(source: &str, target: &str, name: &str) -> ExtractedRelation {
    ExtractedRelation { source_name: source.to_string(), target_name: target.to_string(), relation_name: name.to_string() }
}

#[tokio::test]
async fn dedup_across_two_episodes_produces_three_entities_and_four_mentions() {
    let engine = scripted_engine([
        (
            "Alice met Bob.",
            ExtractedFacts {
                entities: vec![entity("Alice", "person"), entity("Bob", "person")],
                relations: vec![relation("Alice", "Bob", "met")],
            },
        ),
        (
            "Alice also met Carol.",
            ExtractedFacts {
                entities: vec![entity("Alice", "person"), entity("Carol", "person")],
                relations: vec![relation("Alice", "Carol", "met")],
            },
        ),
    ]);

    engine
        .add_memory(AddMemoryParams { content: "Alice met Bob.".to_string(), group_id: "group-1".to_string(), ..Default::default() })
        .await
        .unwrap();
    engine
        .add_memory(AddMemoryParams { content: "Alice also met Carol.".to_string(), group_id: "group-1".to_string(), ..Default::default() })
        .await
        .unwrap();

    let entities = engine.store.entities_by_group("group-1").unwrap();
    let mut names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"], "dedup must grow the entity count by exactly one per new name");

    let episodes = engine.episodes_by_group("group-1").unwrap();
    assert_eq!(episodes.len(), 2, "each add_memory call creates one episodic node");

    assert_eq!(engine.store.mentions_count("group-1").unwrap(), 4, "2 mentions per episode across 2 episodes");

    let alice = entities.iter().find(|e| e.name == "Alice").unwrap();
    let bob = entities.iter().find(|e| e.name == "Bob").unwrap();
    let carol = entities.iter().find(|e| e.name == "Carol").unwrap();
    assert!(engine.store.find_relates_to("group-1", &alice.uuid.to_string(), &bob.uuid.to_string(), "met").unwrap());
    assert!(engine.store.find_relates_to("group-1", &alice.uuid.to_string(), &carol.uuid.to_string(), "met").unwrap());
}
