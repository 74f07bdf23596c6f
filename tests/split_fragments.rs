mod common;

use common::{block, classed, ignored, with_children};
use cursus_pdf::model::{ContentNode, NodePath};
use cursus_pdf::split::{PageFragment, SplitConfig, split, split_planning};

/// 100-unit-wide root with unit scale and a 100-unit page budget.
fn config_for(root: &ContentNode, atomic: &[&str]) -> SplitConfig {
    SplitConfig::for_root(root, 100.0, 100.0, 0.0, atomic)
}

fn slice_paths(fragments: &[PageFragment]) -> Vec<NodePath> {
    fragments
        .iter()
        .flat_map(|f| f.slices.iter().map(|s| s.path.clone()))
        .collect()
}

#[test]
fn greedy_packing_breaks_at_capacity() {
    let root = with_children(
        block(0.0, 120.0),
        vec![block(0.0, 40.0), block(40.0, 50.0), block(90.0, 30.0)],
    );
    let fragments = split(&root, &config_for(&root, &[]));

    assert_eq!(fragments.len(), 2);
    assert_eq!(slice_paths(&fragments), vec![vec![0], vec![1], vec![2]]);
    assert_eq!(fragments[0].height, 90.0);
    assert_eq!(fragments[1].height, 30.0);
    assert!(fragments.iter().all(|f| !f.oversized));
}

#[test]
fn content_filling_the_page_exactly_stays_on_one_page() {
    let children: Vec<ContentNode> = (0..4).map(|i| block(i as f32 * 25.0, 25.0)).collect();
    let root = with_children(block(0.0, 100.0), children);
    let fragments = split(&root, &config_for(&root, &[]));

    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].height, 100.0);
}

#[test]
fn epsilon_tolerates_slight_overflow() {
    let root = with_children(block(0.0, 101.5), vec![block(0.0, 101.5)]);
    let config = SplitConfig::for_root(&root, 100.0, 100.0, 2.0, &[]);
    let fragments = split(&root, &config);

    assert_eq!(fragments.len(), 1);
    assert!(!fragments[0].oversized);
}

#[test]
fn unsplittable_block_taller_than_a_page_is_flagged_once() {
    let mut figure = block(50.0, 150.0);
    figure.tag = "img".to_string();
    let wrapper = with_children(block(50.0, 150.0), vec![figure]);
    let root = with_children(block(0.0, 200.0), vec![block(0.0, 50.0), wrapper]);
    let fragments = split(&root, &config_for(&root, &[]));

    assert_eq!(fragments.len(), 2);
    assert!(!fragments[0].oversized);
    assert!(fragments[1].oversized);
    assert_eq!(fragments[1].slices.len(), 1);
    assert_eq!(fragments[1].slices[0].path, vec![1]);
}

#[test]
fn atomic_class_blocks_descent() {
    let section = classed(
        with_children(
            block(0.0, 150.0),
            vec![block(0.0, 75.0), block(75.0, 75.0)],
        ),
        "module-organisation",
    );
    let root = with_children(block(0.0, 150.0), vec![section]);

    // Without the marker the section splits 75/75 across two pages.
    let plain = split(&root, &config_for(&root, &[]));
    assert_eq!(plain.len(), 2);
    assert_eq!(slice_paths(&plain), vec![vec![0, 0], vec![0, 1]]);

    // With it nothing may be cut, so the whole tree moves as one oversized
    // block.
    let kept = split(&root, &config_for(&root, &["module-organisation"]));
    assert_eq!(kept.len(), 1);
    assert!(kept[0].oversized);
    assert_eq!(slice_paths(&kept), vec![Vec::<usize>::new()]);
}

#[test]
fn ignored_subtrees_are_dropped() {
    let root = with_children(
        block(0.0, 120.0),
        vec![
            block(0.0, 40.0),
            ignored(block(40.0, 500.0)),
            block(40.0, 50.0),
        ],
    );
    let fragments = split(&root, &config_for(&root, &[]));

    assert_eq!(fragments.len(), 1);
    assert_eq!(slice_paths(&fragments), vec![vec![0], vec![2]]);
}

#[test]
fn every_leaf_lands_exactly_once() {
    let root = with_children(
        block(0.0, 260.0),
        vec![
            with_children(block(0.0, 120.0), vec![block(0.0, 60.0), block(60.0, 60.0)]),
            block(120.0, 80.0),
            block(200.0, 60.0),
        ],
    );
    let fragments = split(&root, &config_for(&root, &[]));

    let mut paths = slice_paths(&fragments);
    paths.sort();
    let expected: Vec<NodePath> = vec![vec![0, 0], vec![0, 1], vec![1], vec![2]];
    assert_eq!(paths, expected);
}

#[test]
fn split_is_deterministic() {
    let root = with_children(
        block(0.0, 260.0),
        vec![
            with_children(block(0.0, 120.0), vec![block(0.0, 60.0), block(60.0, 60.0)]),
            block(120.0, 80.0),
            block(200.0, 60.0),
        ],
    );
    let config = config_for(&root, &[]);
    let a = split(&root, &config);
    let b = split(&root, &config);

    assert_eq!(slice_paths(&a), slice_paths(&b));
    assert_eq!(
        a.iter().map(|f| f.height).collect::<Vec<_>>(),
        b.iter().map(|f| f.height).collect::<Vec<_>>()
    );
}

#[test]
fn slice_offsets_stack_from_the_fragment_top() {
    let root = with_children(
        block(0.0, 120.0),
        vec![block(0.0, 40.0), block(40.0, 50.0), block(90.0, 30.0)],
    );
    let fragments = split(&root, &config_for(&root, &[]));

    assert_eq!(fragments[0].slices[0].y_offset, 0.0);
    assert_eq!(fragments[0].slices[1].y_offset, 40.0);
    assert_eq!(fragments[1].slices[0].y_offset, 0.0);
}

fn planning_root(rows: usize, row_h: f32) -> ContentNode {
    let children: Vec<ContentNode> = (0..rows)
        .map(|i| block(i as f32 * row_h, row_h))
        .collect();
    let table = classed(
        with_children(block(0.0, rows as f32 * row_h), children),
        "modules-planning",
    );
    with_children(block(0.0, rows as f32 * row_h), vec![table])
}

#[test]
fn planning_rows_move_in_pairs() {
    let root = planning_root(9, 25.0);
    let fragments = split_planning(&root, &config_for(&root, &[])).expect("planning table");

    // Four 50-unit pairs fill two pages, the trailing aggregate row a third.
    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0].height, 100.0);
    assert_eq!(fragments[1].height, 100.0);
    assert_eq!(fragments[2].height, 25.0);

    // A pair's header row always opens a fragment or follows its sibling.
    for fragment in &fragments {
        let first_row = *fragment.slices[0].path.last().unwrap();
        assert_eq!(first_row % 2, 0);
    }
}

#[test]
fn planning_caption_rides_the_last_page() {
    let mut root = planning_root(9, 25.0);
    root.children
        .push(classed(block(225.0, 30.0), "caption"));
    let fragments = split_planning(&root, &config_for(&root, &[])).expect("planning table");

    assert_eq!(fragments.len(), 3);
    let last = fragments.last().unwrap();
    assert_eq!(last.slices.len(), 2);
    assert_eq!(last.height, 55.0);
}

#[test]
fn over_tall_caption_is_flagged_oversized() {
    let mut root = planning_root(3, 25.0);
    root.children.push(classed(block(75.0, 300.0), "caption"));
    let fragments = split_planning(&root, &config_for(&root, &[])).expect("planning table");

    // The rows share one fragment, the caption gets one of its own.
    assert_eq!(fragments.len(), 2);
    assert!(!fragments[0].oversized);
    let last = fragments.last().unwrap();
    assert_eq!(last.slices.len(), 1);
    assert_eq!(last.height, 300.0);
    assert!(last.oversized);
}

#[test]
fn missing_planning_table_yields_none() {
    let root = with_children(block(0.0, 50.0), vec![block(0.0, 50.0)]);
    assert!(split_planning(&root, &config_for(&root, &[])).is_none());
}
