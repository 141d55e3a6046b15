//! Property tests for index offsets and lengths

mod common;

use chrono::Utc;
use common::TestItem;
use proptest::prelude::*;
use tempfile::TempDir;
use worldsave::{
    DiskWriteSignal, EntityCategory, MemoryWriter, Persistable, SaveConfig, SavePaths,
    StandardSaveStrategy, TriadSummary, World,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn offsets_are_contiguous_and_lengths_exact(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..24)
    ) {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        let mut world = World::new();
        for (i, payload) in payloads.iter().enumerate() {
            let kind = if i % 2 == 0 { "Items.Gold" } else { "Items.Bag" };
            let mut item = TestItem::fresh(i as i32 + 1, kind, now);
            item.payload = payload.clone();
            world.add_item(item);
        }

        let mut strategy =
            StandardSaveStrategy::new(SaveConfig::new(temp_dir.path()), DiskWriteSignal::new());
        strategy.save_at(&world, None, false, now).unwrap();

        let triad = SavePaths::new(temp_dir.path()).triad(EntityCategory::Item);
        let summary = TriadSummary::load(&triad, EntityCategory::Item).unwrap();
        prop_assert_eq!(summary.entity_count(), payloads.len());
        prop_assert!(summary.verify().is_ok());

        let mut expected_offset = 0u64;
        for (record, payload) in summary.records.iter().zip(&payloads) {
            let mut writer = MemoryWriter::new(true);
            world.item(record.serial).unwrap().serialize(&mut writer).unwrap();

            prop_assert_eq!(record.offset, expected_offset);
            prop_assert_eq!(record.length as usize, writer.as_bytes().len());
            prop_assert!(record.length as usize > payload.len());
            expected_offset += record.length as u64;
        }
        prop_assert_eq!(expected_offset, summary.data_len);
    }
}
