use super::*;

#[test]
fn test_index_after_last() {
    assert_eq!(index_after_last([]), FIRST_INDEX);
    assert_eq!(index_after_last([0.0, 5.0, 1.0]), 6.0);
    assert_eq!(index_after_last([-3.5]), -2.5);
}

#[test]
fn test_index_before_head_and_midpoint() {
    assert_eq!(index_before(0.0, None), Some(-1.0));
    assert_eq!(index_before(1.0, Some(0.0)), Some(0.5));
    assert_eq!(index_before(0.5, Some(0.0)), Some(0.25));
}

#[test]
fn test_repeated_head_inserts_stay_distinct() {
    let mut anchor = 0.0;
    for _ in 0..100 {
        let index = index_before(anchor, None).unwrap();
        assert!(index < anchor);
        anchor = index;
    }
}

#[test]
fn test_precision_runs_out_between_neighbours() {
    let mut prev = 0.0;
    let anchor = 1.0;
    let mut exhausted = false;
    for _ in 0..60 {
        match index_before(anchor, Some(prev)) {
            Some(index) => {
                assert!(index > prev && index < anchor);
                prev = index;
            }
            None => {
                exhausted = true;
                break;
            }
        }
    }
    assert!(exhausted);
}

#[test]
fn test_head_step_lost_at_large_magnitude() {
    assert_eq!(index_before(1e17, None), None);
}

#[test]
fn test_rebalanced_is_dense() {
    let indices: Vec<f64> = rebalanced(4).collect();
    assert_eq!(indices, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(rebalanced(0).count(), 0);
}

#[test]
fn test_compare_orders_negative_before_positive() {
    assert_eq!(compare(-1.0, 0.0), Ordering::Less);
    assert_eq!(compare(0.5, 0.5), Ordering::Equal);
}
