/// Tests for TargetPool
///
/// These tests validate exact-match reuse, allocation on misses,
/// failure atomicity, teardown and the readback path, all against
/// the mock device (no GPU required).

use super::*;
use crate::device::mock_device::{MockContext, MockDevice};
use crate::device::{Resource, SampleDesc, TargetFormat, TargetView};
use crate::error::Error;
use crate::target::AUTO_GENERATE_MIPS;

fn setup() -> (Rc<MockDevice>, TargetPool) {
    let device = Rc::new(MockDevice::new());
    let pool = TargetPool::new(device.clone());
    (device, pool)
}

fn color_desc() -> TargetDesc {
    TargetDesc::simple(256, 256, TargetFormat::R8G8B8A8_UNORM)
}

fn depth_desc() -> TargetDesc {
    TargetDesc::simple(256, 256, TargetFormat::D32_FLOAT)
}

// ============================================================================
// Tests: Acquire / Reuse
// ============================================================================

#[test]
fn test_acquire_twice_gives_distinct_targets() {
    let (device, pool) = setup();

    let a = pool.acquire_color(&color_desc()).unwrap();
    let b = pool.acquire_color(&color_desc()).unwrap();

    assert!(!a.same_target(&b));
    assert_ne!(a.key(), b.key());
    assert!(a.is_in_use());
    assert!(b.is_in_use());
    assert_eq!(device.created(), 2);
    assert_eq!(pool.color_target_count(), 2);
}

#[test]
fn test_release_then_acquire_reuses_target() {
    let (device, pool) = setup();

    let first = pool.acquire_color(&color_desc()).unwrap();
    let key = first.key();
    let id = first.resource().id();
    drop(first);

    let second = pool.acquire_color(&color_desc()).unwrap();
    assert_eq!(second.key(), key);
    assert_eq!(second.resource().id(), id);
    assert_eq!(device.created(), 1);
    assert_eq!(pool.color_target_count(), 1);
}

#[test]
fn test_released_target_is_idle() {
    let (_device, pool) = setup();

    let target = pool.acquire_color(&color_desc()).unwrap();
    assert_eq!(pool.stats().color.in_use, 1);
    drop(target);

    let stats = pool.stats();
    assert_eq!(stats.color.allocated, 1);
    assert_eq!(stats.color.in_use, 0);
}

#[test]
fn test_clone_keeps_target_in_use() {
    let (device, pool) = setup();

    let first = pool.acquire_color(&color_desc()).unwrap();
    let copy = first.clone();
    assert_eq!(copy.base().references(), 2);
    drop(first);

    // still held through the clone
    let other = pool.acquire_color(&color_desc()).unwrap();
    assert!(!other.same_target(&copy));
    assert_eq!(device.created(), 2);

    drop(copy);
    drop(other);
    assert_eq!(pool.stats().total_in_use(), 0);
}

#[test]
fn test_single_field_difference_allocates() {
    let (device, pool) = setup();
    let desc = color_desc();
    let variants = [
        TargetDesc { width: 257, ..desc },
        TargetDesc { height: 255, ..desc },
        TargetDesc { mip_levels: 2, ..desc },
        TargetDesc { mip_levels: 1 | AUTO_GENERATE_MIPS, ..desc },
        TargetDesc { format: TargetFormat::R8G8B8A8_SRGB, ..desc },
        TargetDesc { samples: SampleDesc::new(4, 0), ..desc },
        TargetDesc { samples: SampleDesc::new(1, 1), ..desc },
        TargetDesc { count: 2, ..desc },
    ];

    drop(pool.acquire_color(&desc).unwrap());
    for (i, variant) in variants.iter().enumerate() {
        let target = pool.acquire_color(variant).unwrap();
        assert_eq!(target.desc(), variant);
        assert_eq!(device.created() as usize, i + 2, "variant {} matched an idle target", variant);
    }
}

#[test]
fn test_first_idle_match_in_allocation_order() {
    let (_device, pool) = setup();

    let a = pool.acquire_color(&color_desc()).unwrap();
    let b = pool.acquire_color(&color_desc()).unwrap();
    let (key_a, key_b) = (a.key(), b.key());
    drop(b);
    drop(a);

    let first = pool.acquire_color(&color_desc()).unwrap();
    let second = pool.acquire_color(&color_desc()).unwrap();
    assert_eq!(first.key(), key_a);
    assert_eq!(second.key(), key_b);
}

#[test]
fn test_kinds_are_pooled_separately() {
    let (device, pool) = setup();
    let desc = color_desc();

    drop(pool.acquire_color(&desc).unwrap());
    drop(pool.acquire_stage(&desc).unwrap());
    drop(pool.acquire_depth_stencil(&depth_desc()).unwrap());

    let stats = pool.stats();
    assert_eq!(stats.color.allocated, 1);
    assert_eq!(stats.stage.allocated, 1);
    assert_eq!(stats.depth_stencil.allocated, 1);
    assert_eq!(stats.total_allocated(), 3);

    let requests = device.requests.borrow();
    let kinds: Vec<TargetKind> = requests.iter().map(|(_, kind)| *kind).collect();
    assert_eq!(kinds, vec![TargetKind::Color, TargetKind::Stage, TargetKind::DepthStencil]);
}

#[test]
fn test_device_receives_requested_desc() {
    let (device, pool) = setup();
    let desc = color_desc().with_count(6).with_auto_mips();

    let target = pool.acquire_color(&desc).unwrap();

    assert_eq!(device.requests.borrow()[0], (desc, TargetKind::Color));
    assert_eq!(target.slice_view_count(), 6);
}

#[test]
fn test_depth_stencil_target_views() {
    let (_device, pool) = setup();

    let depth = pool.acquire_depth_stencil(&depth_desc()).unwrap();

    assert_eq!(depth.kind(), TargetKind::DepthStencil);
    assert_eq!(depth.target_view().resource_id(), depth.resource().id());
    assert_eq!(depth.target_view_at(3).slice(), None);
}

// ============================================================================
// Tests: Failures
// ============================================================================

#[test]
fn test_device_failure_propagates_without_side_effects() {
    let (device, pool) = setup();
    device.fail_next.set(true);

    let result = pool.acquire_color(&color_desc());

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(pool.color_target_count(), 0);

    // next attempt succeeds and is the only stored target
    let target = pool.acquire_color(&color_desc()).unwrap();
    assert_eq!(target.base().references(), 1);
    assert_eq!(pool.color_target_count(), 1);
}

#[test]
fn test_invalid_parts_are_not_stored() {
    let (device, pool) = setup();
    device.omit_target_view.set(true);

    let result = pool.acquire_color(&color_desc());

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(pool.color_target_count(), 0);
    assert_eq!(device.created(), 1);
    assert_eq!(device.destroyed(), 1);
}

#[test]
fn test_stage_with_view_is_rejected() {
    let (device, pool) = setup();
    device.stage_with_view.set(true);

    assert!(pool.acquire_stage(&color_desc()).is_err());
    assert_eq!(pool.stage_target_count(), 0);
}

// ============================================================================
// Tests: Teardown
// ============================================================================

#[test]
fn test_teardown_destroys_every_target_once() {
    let device = Rc::new(MockDevice::new());
    {
        let pool = TargetPool::new(device.clone());
        let _a = pool.acquire_color(&color_desc()).unwrap();
        drop(pool.acquire_color(&color_desc().with_count(4)).unwrap());
        drop(pool.acquire_depth_stencil(&depth_desc()).unwrap());
        drop(pool.acquire_stage(&color_desc()).unwrap());
        assert_eq!(device.destroyed(), 0);
    }
    assert_eq!(device.created(), 4);
    assert_eq!(device.destroyed(), 4);
}

#[test]
fn test_teardown_destroys_targets_still_in_use() {
    let device = Rc::new(MockDevice::new());
    {
        let pool = TargetPool::new(device.clone());
        std::mem::forget(pool.acquire_color(&color_desc()).unwrap());
        let held = pool.acquire_depth_stencil(&depth_desc()).unwrap();
        std::mem::forget(held.clone());
        drop(held);

        let stats = pool.stats();
        assert_eq!(stats.color.in_use, 1);
        assert_eq!(stats.depth_stencil.in_use, 1);
    }
    assert_eq!(device.created(), 2);
    assert_eq!(device.destroyed(), 2);
}

#[test]
fn test_guard_borrows_pool_owned_target() {
    let (_device, pool) = setup();

    let a = pool.acquire_color(&color_desc()).unwrap();
    let b = a.clone();
    assert!(a.same_target(&b));
    assert!(std::ptr::eq(&*a, &*b));
    drop(a);
    assert_eq!(b.base().references(), 1);
}

// ============================================================================
// Tests: Configuration
// ============================================================================

#[test]
fn test_default_config() {
    let (_device, pool) = setup();
    assert_eq!(pool.config().label, "TargetPool");
    assert_eq!(pool.config().growth_warning_threshold, 64);
}

#[test]
fn test_custom_config() {
    let device = Rc::new(MockDevice::new());
    let config = PoolConfig {
        label: "ShadowPool".to_string(),
        growth_warning_threshold: 0,
    };
    let pool = TargetPool::with_config(device, config);

    assert_eq!(pool.config().label, "ShadowPool");
    // no threshold: growth never warns, allocation still works
    let targets: Vec<_> = (0..3).map(|_| pool.acquire_color(&color_desc()).unwrap()).collect();
    assert_eq!(targets.len(), 3);
}

// ============================================================================
// Tests: Read Back
// ============================================================================

/// 2x2 RGBA8 image mapped with 16 bytes of row pitch
fn padded_image() -> Vec<u8> {
    let mut data = vec![0xEE; 32];
    data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    data[16..24].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
    data
}

fn small_desc() -> TargetDesc {
    TargetDesc::simple(2, 2, TargetFormat::R8G8B8A8_UNORM)
}

#[test]
fn test_read_back_copies_rows() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 16];

    assert!(pool.read_back(&*target, &mut memory, &mut context, 0));

    assert_eq!(memory, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
    assert_eq!(context.calls, vec!["copy", "map 0", "unmap 0"]);
}

#[test]
fn test_read_back_partial_buffer() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 10];

    assert!(pool.read_back(&*target, &mut memory, &mut context, 0));
    assert_eq!(memory, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
}

#[test]
fn test_read_back_releases_stage_target() {
    let (device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 16];

    assert!(pool.read_back(&*target, &mut memory, &mut context, 0));
    assert!(pool.read_back(&*target, &mut memory, &mut context, 0));

    let stats = pool.stats();
    assert_eq!(stats.stage.allocated, 1);
    assert_eq!(stats.stage.in_use, 0);
    assert_eq!(device.requests.borrow()[1], (small_desc(), TargetKind::Stage));
}

#[test]
fn test_read_back_copy_failure() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    context.fail_copy = true;
    let mut memory = [0u8; 16];

    assert!(!pool.read_back(&*target, &mut memory, &mut context, 0));
    assert_eq!(memory, [0; 16]);
    assert_eq!(context.calls, vec!["copy"]);
    assert_eq!(pool.stats().stage.in_use, 0);
}

#[test]
fn test_read_back_map_failure() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    context.fail_map = true;
    let mut memory = [0u8; 16];

    assert!(!pool.read_back(&*target, &mut memory, &mut context, 0));
    assert_eq!(memory, [0; 16]);
    assert_eq!(context.calls, vec!["copy", "map 0"]);
}

#[test]
fn test_read_back_short_mapping_still_unmaps() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(vec![0xAB; 8], 16);
    let mut memory = [0u8; 16];

    assert!(!pool.read_back(&*target, &mut memory, &mut context, 0));
    assert_eq!(memory, [0; 16]);
    assert_eq!(context.calls, vec!["copy", "map 0", "unmap 0"]);
}

#[test]
fn test_read_back_stage_allocation_failure() {
    let (device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    device.fail_next.set(true);
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 16];

    assert!(!pool.read_back(&*target, &mut memory, &mut context, 0));
    assert!(context.calls.is_empty());
}

#[test]
fn test_read_back_subresource_out_of_range() {
    let (_device, pool) = setup();
    let target = pool.acquire_color(&small_desc()).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 16];

    assert!(!pool.read_back(&*target, &mut memory, &mut context, 1));
    assert!(context.calls.is_empty());
    assert_eq!(pool.stage_target_count(), 0);
}

#[test]
fn test_read_back_array_slice() {
    let (_device, pool) = setup();
    let desc = small_desc().with_count(3);
    let target = pool.acquire_color(&desc).unwrap();
    let mut context = MockContext::new(padded_image(), 16);
    let mut memory = [0u8; 16];

    assert!(pool.read_back(&*target, &mut memory, &mut context, desc.subresource(0, 2)));
    assert_eq!(context.calls, vec!["copy", "map 2", "unmap 2"]);
}
