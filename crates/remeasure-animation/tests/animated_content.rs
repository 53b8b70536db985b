use remeasure_animation::prelude::*;
use remeasure_geometry::{Point, Size};
use remeasure_layout::{Constraints, NodeId};
use remeasure_testing::prelude::*;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Page {
    Short,
    Tall,
}

impl Page {
    fn size(self) -> Size {
        match self {
            Page::Short => Size::new(100.0, 50.0),
            Page::Tall => Size::new(60.0, 80.0),
        }
    }
}

fn linear(millis: u64) -> AnimationType {
    AnimationSpec::linear(millis).into()
}

fn slide_over(_: &Segment<Page>) -> ContentTransform {
    ContentTransform::new(
        EnterTransition::slide_in_horizontally(linear(100)),
        ExitTransition::fade_out(linear(100), 0.0),
    )
    .using(Some(SizeTransform::new(true, |_, _| linear(100))))
}

/// Composes and removes content nodes the way a host reacting to the
/// coordinator's events would.
fn sync(harness: &mut LayoutHarness, container: NodeId, content: &ContentTransitionCoordinator<Page>) {
    for event in content.take_events() {
        match event {
            ContentEvent::Shown(page) => {
                let (node, _) = harness.leaf(page.size());
                harness.append(container, node);
                assert!(content.bind_node(&page, node));
            }
            ContentEvent::Disposed { node, .. } => {
                if let Some(node) = node {
                    harness
                        .scheduler_mut()
                        .remove_child(container, node)
                        .unwrap();
                }
            }
        }
    }
}

fn setup(lookahead: bool) -> (LayoutHarness, NodeId, ContentTransitionCoordinator<Page>) {
    let mut harness = LayoutHarness::new(Constraints::loose(400.0, 400.0));
    let content = ContentTransitionCoordinator::new(Page::Short, slide_over);
    let container = harness.node(Rc::new(AnimatedContentPolicy::new(content.clone())));
    harness.set_root(container);
    if lookahead {
        harness
            .scheduler_mut()
            .set_lookahead_root(container, true)
            .unwrap();
    }
    sync(&mut harness, container, &content);
    harness.pass();
    (harness, container, content)
}

#[test]
fn container_follows_the_target_through_a_lookahead_pass() {
    let (mut harness, container, content) = setup(true);
    assert_eq!(harness.size(container), Some(Page::Short.size()));
    let short = content.node_for(&Page::Short).unwrap();

    let mut driver = FrameDriver::new();
    content.attach_clock(driver.clock());
    content.set_target(Page::Tall);
    sync(&mut harness, container, &content);
    harness.pass();

    let tall = content.node_for(&Page::Tall).unwrap();
    assert_eq!(content.try_target_size(&Page::Tall), Some(Page::Tall.size()));
    assert_eq!(harness.size(container), Some(Page::Short.size()));
    assert_eq!(harness.position(tall), Point::new(-60.0, 0.0));
    assert_eq!(
        harness.scheduler().tree().children(container),
        &[short, tall]
    );

    let mut widths = Vec::new();
    let mut offsets = Vec::new();
    driver.run_until_idle(100, |_| {
        sync(&mut harness, container, &content);
        harness.scheduler_mut().invalidate_measurement(container);
        harness.pass();
        if let Some(size) = harness.size(container) {
            widths.push(size.width);
        }
        offsets.push(harness.position(tall).x);
    });

    assert!(widths.windows(2).all(|pair| pair[1] <= pair[0]), "{widths:?}");
    assert!(offsets.windows(2).all(|pair| pair[1] >= pair[0]), "{offsets:?}");
    assert_eq!(harness.size(container), Some(Page::Tall.size()));
    assert_eq!(harness.position(tall), Point::ZERO);
    assert_eq!(content.visible_states(), vec![Page::Tall]);
    assert_eq!(content.sized_states(), vec![Page::Tall]);
    assert_eq!(harness.scheduler().tree().children(container), &[tall]);
}

#[test]
fn container_outside_lookahead_records_sizes_in_the_real_pass() {
    let (mut harness, container, content) = setup(false);
    assert_eq!(content.try_target_size(&Page::Short), Some(Page::Short.size()));

    content.set_target(Page::Tall);
    sync(&mut harness, container, &content);
    harness.pass();
    assert_eq!(content.try_target_size(&Page::Tall), Some(Page::Tall.size()));
    assert_eq!(harness.size(container), Some(Page::Short.size()));

    content.on_frame(0);
    content.on_frame(50_000_000);
    sync(&mut harness, container, &content);
    harness.scheduler_mut().invalidate_measurement(container);
    harness.pass();
    let halfway = harness.size(container).unwrap();
    assert_size_approx_eq(halfway, Size::new(80.0, 65.0), 1e-3, "halfway container size");

    assert!(!content.on_frame(100_000_000));
    sync(&mut harness, container, &content);
    harness.scheduler_mut().invalidate_measurement(container);
    harness.pass();
    assert_eq!(harness.size(container), Some(Page::Tall.size()));
    assert_eq!(harness.scheduler().tree().children(container).len(), 1);
}
