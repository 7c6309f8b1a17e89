use carelog_core::palette::{
    assign_display_colors, ensure_stored_colors, generate_card_color, pack_argb, packed_palette,
    CARD_PALETTE,
};
use carelog_core::Client;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn clients(count: i64) -> Vec<Client> {
    let created_at = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..count)
        .map(|id| Client::new(id, format!("client {id}"), created_at))
        .collect()
}

#[test]
fn up_to_eight_clients_get_distinct_palette_colors() {
    let mut rng = StdRng::seed_from_u64(7);
    let (assigned, changed) = ensure_stored_colors(clients(8), &mut rng);

    assert!(changed);
    let colors = assigned.iter().map(|c| c.color).collect::<HashSet<_>>();
    assert_eq!(colors.len(), 8);
    assert!(colors.iter().all(|color| packed_palette().contains(color)));
}

#[test]
fn more_than_eight_clients_reuse_palette_colors() {
    let mut rng = StdRng::seed_from_u64(11);
    let (assigned, _) = ensure_stored_colors(clients(12), &mut rng);

    assert!(assigned.iter().all(|c| packed_palette().contains(&c.color)));
    let colors = assigned.iter().map(|c| c.color).collect::<HashSet<_>>();
    assert_eq!(colors.len(), 8);
}

#[test]
fn ensure_is_idempotent_and_keeps_stored_colors() {
    let mut input = clients(3);
    input[1].color = pack_argb(CARD_PALETTE[4]);

    let mut rng = StdRng::seed_from_u64(3);
    let (first, changed) = ensure_stored_colors(input, &mut rng);
    assert!(changed);
    assert_eq!(first[1].color, pack_argb(CARD_PALETTE[4]));

    let (second, changed_again) = ensure_stored_colors(first.clone(), &mut rng);
    assert!(!changed_again);
    assert_eq!(second, first);
}

#[test]
fn stored_colors_are_excluded_for_later_clients() {
    let mut input = clients(2);
    input[0].color = pack_argb(CARD_PALETTE[0]);

    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (assigned, _) = ensure_stored_colors(input.clone(), &mut rng);
        assert_ne!(assigned[1].color, assigned[0].color);
    }
}

#[test]
fn generate_falls_back_to_full_palette_when_exhausted() {
    let mut rng = StdRng::seed_from_u64(5);
    let all = packed_palette().into_iter().collect::<HashSet<_>>();
    let color = generate_card_color(&all, &mut rng);
    assert!(all.contains(&color));

    let mut almost = all.clone();
    almost.remove(&pack_argb(CARD_PALETTE[6]));
    assert_eq!(generate_card_color(&almost, &mut rng), pack_argb(CARD_PALETTE[6]));
}

#[test]
fn display_colors_use_stored_values_and_palette_for_missing() {
    let mut input = clients(2);
    input[0].color = pack_argb(CARD_PALETTE[2]);

    let mut rng = StdRng::seed_from_u64(9);
    let colors = assign_display_colors(&input, &mut rng);

    assert_eq!(colors.len(), 2);
    assert_eq!(colors[&0], CARD_PALETTE[2]);
    assert!(CARD_PALETTE.contains(&colors[&1]));
}
