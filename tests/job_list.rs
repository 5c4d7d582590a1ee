// tests/job_list.rs

use std::path::PathBuf;

use blastq::queue::{EnqueueRejected, JobItem, JobList};
use blastq::types::JobStatus;

fn list_of(names: &[&str]) -> JobList {
    let mut list = JobList::new();
    for name in names {
        list.enqueue(PathBuf::from(name)).unwrap();
    }
    list
}

fn paths(list: &JobList) -> Vec<PathBuf> {
    list.items().iter().map(|i| i.path().to_path_buf()).collect()
}

#[test]
fn enqueue_appends_in_order_as_queued() {
    let list = list_of(&["a.fasta", "b.fasta", "c.fasta"]);
    assert_eq!(list.len(), 3);
    assert_eq!(
        paths(&list),
        vec![
            PathBuf::from("a.fasta"),
            PathBuf::from("b.fasta"),
            PathBuf::from("c.fasta")
        ]
    );
    assert!(list.items().iter().all(|i| i.status() == JobStatus::Queued));
    assert!(list.has_queued());
    assert!(list.running().is_none());
}

#[test]
fn duplicate_queued_path_is_rejected() {
    let mut list = list_of(&["a.fasta"]);
    let err = list.enqueue("a.fasta").unwrap_err();
    assert_eq!(err, EnqueueRejected::Duplicate(PathBuf::from("a.fasta")));
    assert_eq!(list.len(), 1);
}

#[test]
fn remove_selected_ignores_out_of_range_and_repeats() {
    let mut list = list_of(&["a", "b", "c", "d"]);
    let outcome = list.remove_selected(&[3, 1, 1, 42]);
    assert_eq!(outcome.removed, 2);
    assert!(!outcome.blocked_by_running);
    assert_eq!(paths(&list), vec![PathBuf::from("a"), PathBuf::from("c")]);
}

#[test]
fn remove_selected_with_nothing_selected_is_a_no_op() {
    let mut list = list_of(&["a"]);
    let outcome = list.remove_selected(&[]);
    assert_eq!(outcome.removed, 0);
    assert_eq!(list.len(), 1);
}

#[test]
fn clear_removes_everything_when_idle() {
    let mut list = list_of(&["a", "b"]);
    assert_eq!(list.clear(), 2);
    assert!(list.is_empty());
    assert_eq!(list.clear(), 0);
}

#[test]
fn removed_path_can_be_queued_again() {
    let mut list = list_of(&["a"]);
    list.remove_selected(&[0]);
    assert!(list.enqueue("a").is_ok());
    assert_eq!(list.status_of(std::path::Path::new("a")), Some(JobStatus::Queued));
}

#[test]
fn count_and_status_lookup() {
    let list = list_of(&["a", "b"]);
    assert_eq!(list.count(JobStatus::Queued), 2);
    assert_eq!(list.count(JobStatus::Running), 0);
    assert_eq!(list.status_of(std::path::Path::new("b")), Some(JobStatus::Queued));
    assert_eq!(list.status_of(std::path::Path::new("zzz")), None);
}

#[test]
fn new_item_is_active_and_not_terminal() {
    let item = JobItem::new("x.fasta");
    assert_eq!(item.status(), JobStatus::Queued);
    assert!(item.is_active());
    assert!(!item.status().is_terminal());
    assert!(JobStatus::Done.is_terminal());
    assert!(JobStatus::Errored.is_terminal());
}
