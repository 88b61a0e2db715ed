use super::*;

#[test]
fn worked_example_1990_07_16() {
    // day 16 -> 7, month 7 -> 7, year 1990 -> 19 -> 10 -> 1, sum 15 -> 6
    let lp = life_path_number(1990, 7, 16);
    assert_eq!(lp.value, 6);
    assert!(!lp.master);
}

#[test]
fn master_number_preserved_in_component() {
    // day 29 -> 11 stays 11; month 1; year 1980 -> 18 -> 9; 11 + 1 + 9 = 21 -> 3
    let lp = life_path_number(1980, 1, 29);
    assert_eq!(lp.value, 3);
    assert!(!lp.master);
}

#[test]
fn master_day_does_not_force_master_total() {
    // day 22 stays 22; month 2; year 1979 -> 26 -> 8; 22 + 2 + 8 = 32 -> 5
    let lp = life_path_number(1979, 2, 22);
    assert_eq!(lp.value, 5);
    assert!(!lp.master);
}

#[test]
fn master_number_as_final_value() {
    // day 29 -> 11, month 11 stays 11, year 1910 -> 11 stays 11; 11+11+11 = 33
    let lp = life_path_number(1910, 11, 29);
    assert_eq!(lp.value, 33);
    assert!(lp.master);
}

#[test]
fn single_digit_components_pass_through() {
    // 5 + 5 + (2003 -> 5) = 15 -> 6
    let lp = life_path_number(2003, 5, 5);
    assert_eq!(lp.value, 6);
}

#[test]
fn reduce_is_stable_for_small_values() {
    for value in 1..=9 {
        let lp = life_path_number(0, 0, value);
        assert_eq!(lp.value, value);
    }
}
