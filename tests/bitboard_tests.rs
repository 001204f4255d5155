use battleship_server::{BitBoard, BitBoardError};

#[test]
fn test_set_reports_first_write() {
    let mut bb = BitBoard::<u16, 4>::new();
    assert!(bb.is_empty());

    assert!(bb.set(1, 2).unwrap());
    assert!(!bb.set(1, 2).unwrap());
    assert!(bb.get(1, 2).unwrap());
    assert!(!bb.get(2, 1).unwrap());
    assert_eq!(bb.count_ones(), 1);
}

#[test]
fn test_out_of_bounds() {
    let mut bb = BitBoard::<u128, 10>::new();
    assert_eq!(
        bb.set(10, 0),
        Err(BitBoardError::IndexOutOfBounds { x: 10, y: 0 })
    );
    assert!(bb.get(0, 10).is_err());
    assert!(!BitBoard::<u128, 10>::contains(3, 10));
    assert!(BitBoard::<u128, 10>::contains(9, 9));
}

#[test]
fn test_clear_iteration_is_row_major() {
    let mut bb = BitBoard::<u16, 4>::new();
    for (x, y) in [(0, 0), (1, 0), (3, 0), (0, 1)] {
        bb.set(x, y).unwrap();
    }
    let clear: Vec<_> = bb.iter_clear().take(3).collect();
    assert_eq!(clear, vec![(2, 0), (1, 1), (2, 1)]);
    assert_eq!(bb.iter_clear().count(), 16 - 4);
}

#[test]
fn test_full_board() {
    let mut bb = BitBoard::<u128, 10>::new();
    for y in 0..10 {
        for x in 0..10 {
            assert!(!bb.is_full());
            bb.set(x, y).unwrap();
        }
    }
    assert!(bb.is_full());
    assert_eq!(bb.count_ones(), 100);
    assert_eq!(bb.iter_clear().next(), None);
}

#[test]
fn test_and_keeps_common_cells() {
    let mut a = BitBoard::<u64, 8>::new();
    let mut b = BitBoard::<u64, 8>::new();
    a.set(0, 0).unwrap();
    a.set(1, 1).unwrap();
    b.set(2, 2).unwrap();
    assert!((a & b).is_empty());

    b.set(1, 1).unwrap();
    let both = a & b;
    assert_eq!(both.count_ones(), 1);
    assert!(both.get(1, 1).unwrap());
}
