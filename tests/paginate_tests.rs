// tests for page slicing and the page query parameter

use trivia::{QUESTIONS_PER_PAGE, page_number, paginate};

fn items(n: usize) -> Vec<usize> {
    (0..n).collect()
}

#[test]
fn test_first_page() {
    let all = items(25);
    let page = paginate(1, &all);

    assert_eq!(page.len(), QUESTIONS_PER_PAGE);
    assert_eq!(page, &all[..10]);
}

#[test]
fn test_first_page_short_list() {
    let all = items(4);
    assert_eq!(paginate(1, &all), &[0, 1, 2, 3]);
}

#[test]
fn test_last_partial_page() {
    let all = items(25);
    assert_eq!(paginate(3, &all), &[20, 21, 22, 23, 24]);
}

#[test]
fn test_page_past_end_is_empty() {
    let all = items(20);
    assert!(paginate(3, &all).is_empty());
    assert!(paginate(1000, &all).is_empty());
}

#[test]
fn test_page_below_one_is_empty() {
    let all = items(20);
    assert!(paginate(0, &all).is_empty());
    assert!(paginate(-3, &all).is_empty());
    assert!(paginate(i64::MIN, &all).is_empty());
}

#[test]
fn test_empty_input() {
    let none: Vec<usize> = Vec::new();
    assert!(paginate(1, &none).is_empty());
}

#[test]
fn test_borrows_input_elements() {
    let all = vec![String::from("a"), String::from("b")];
    let page = paginate(1, &all);

    assert!(std::ptr::eq(&page[0], &all[0]));
    assert_eq!(all.len(), 2);
}

#[test]
fn test_page_number_parsing() {
    assert_eq!(page_number(None), 1);
    assert_eq!(page_number(Some("2")), 2);
    assert_eq!(page_number(Some(" 3 ")), 3);
    assert_eq!(page_number(Some("abc")), 1);
    assert_eq!(page_number(Some("")), 1);
    assert_eq!(page_number(Some("-1")), -1);
}
