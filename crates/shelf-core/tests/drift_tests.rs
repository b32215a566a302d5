//! Tests for read-only status and diff reporting.

use pretty_assertions::assert_eq;
use shelf_core::{Book, DiffReport, DriftReport, DriftReporter, PendingAction, Reconciler};
use shelf_fs::LocalFs;
use shelf_git::LibGitBackend;
use shelf_test_utils::counting::{CountingFs, CountingVcs};
use shelf_test_utils::fake::UnreachableVcs;
use shelf_test_utils::git::{FIRST_TAG, dirty_worktree};
use shelf_test_utils::shelf::TestShelf;

/// A workspace with `libs/foo` cloned on `master`.
fn installed() -> (TestShelf, String, String) {
    let shelf = TestShelf::new();
    let upstream = shelf.upstream("foo");
    let book = Book::git_repo(shelf.path("libs/foo"), upstream.url(), "master").unwrap();
    Reconciler::new(&LibGitBackend::new(), &LocalFs)
        .reconcile(&book)
        .unwrap();
    (shelf, upstream.url(), upstream.second_commit.clone())
}

#[test]
fn test_missing_repository_never_reaches_backend() {
    let shelf = TestShelf::new();
    let book = Book::git_repo(shelf.path("libs/foo"), "https://example.com/foo.git", "master").unwrap();
    let reporter = DriftReporter::new(&UnreachableVcs, &LocalFs);

    let status = reporter.status(&book).unwrap();
    assert_eq!(status, DriftReport::Missing);
    assert_eq!(status.pending_action(&book), Some(PendingAction::Clone));
    assert!(!status.is_ok());

    assert_eq!(reporter.diff(&book).unwrap(), DiffReport::Missing);
}

#[test]
fn test_clean_checkout() {
    let (shelf, url, _) = installed();
    let book = Book::git_repo(shelf.path("libs/foo"), url, "master").unwrap();
    let vcs = LibGitBackend::new();
    let reporter = DriftReporter::new(&vcs, &LocalFs);

    let status = reporter.status(&book).unwrap();
    assert_eq!(status, DriftReport::Clean);
    assert!(status.is_ok());
    assert_eq!(status.pending_action(&book), None);
    assert_eq!(reporter.diff(&book).unwrap(), DiffReport::Clean);
}

#[test]
fn test_dirty_checkout() {
    let (shelf, url, _) = installed();
    dirty_worktree(&shelf.path("libs/foo"));
    let book = Book::git_repo(shelf.path("libs/foo"), url, "master").unwrap();
    let vcs = LibGitBackend::new();
    let reporter = DriftReporter::new(&vcs, &LocalFs);

    let DriftReport::Dirty { changes } = reporter.status(&book).unwrap() else {
        panic!("expected a dirty checkout");
    };
    assert!(changes.iter().any(|line| line.contains("README.md")), "changes: {changes:?}");

    let DiffReport::Changes { diff } = reporter.diff(&book).unwrap() else {
        panic!("expected a diff");
    };
    assert!(diff.contains("locally edited"), "diff: {diff}");
}

#[test]
fn test_dirty_checkout_needs_no_reconcile() {
    let (shelf, url, _) = installed();
    dirty_worktree(&shelf.path("libs/foo"));
    let book = Book::git_repo(shelf.path("libs/foo"), url, "master").unwrap();

    let status = DriftReporter::new(&LibGitBackend::new(), &LocalFs)
        .status(&book)
        .unwrap();
    assert_eq!(status.pending_action(&book), None);
}

#[test]
fn test_wrong_reference() {
    let (shelf, url, head) = installed();
    let book = Book::git_repo(shelf.path("libs/foo"), url, FIRST_TAG).unwrap();

    let status = DriftReporter::new(&LibGitBackend::new(), &LocalFs)
        .status(&book)
        .unwrap();

    assert_eq!(
        status,
        DriftReport::WrongReference {
            actual: "master".to_string(),
            commit: head,
            expected: FIRST_TAG.to_string(),
        }
    );
    assert_eq!(status.pending_action(&book), Some(PendingAction::FetchCheckout));
}

#[test]
fn test_status_performs_no_mutation() {
    let (shelf, url, _) = installed();
    let book = Book::git_repo(shelf.path("libs/foo"), url, FIRST_TAG).unwrap();
    let link = Book::symbolic_link(shelf.path("links/foo"), "../libs/foo").unwrap();

    let vcs = CountingVcs::new(LibGitBackend::new());
    let fs = CountingFs::new(LocalFs);
    let reporter = DriftReporter::new(&vcs, &fs);
    for book in [&book, &link] {
        reporter.status(book).unwrap();
        reporter.diff(book).unwrap();
    }

    assert_eq!(vcs.counts.mutations(), 0);
    assert_eq!(fs.counts.mutations(), 0);
    shelf.assert_not_exists("links/foo");
}

#[test]
fn test_missing_link() {
    let shelf = TestShelf::new();
    let book = Book::symbolic_link(shelf.path("links/foo"), "../target").unwrap();
    let reporter = DriftReporter::new(&UnreachableVcs, &LocalFs);

    let status = reporter.status(&book).unwrap();
    assert_eq!(status, DriftReport::Missing);
    assert_eq!(status.pending_action(&book), Some(PendingAction::CreateLink));
    assert_eq!(reporter.diff(&book).unwrap(), DiffReport::Missing);
}

#[test]
fn test_directory_at_link_path_reads_as_missing() {
    let shelf = TestShelf::new();
    shelf.mkdir("links/foo");
    let book = Book::symbolic_link(shelf.path("links/foo"), "../target").unwrap();

    let status = DriftReporter::new(&UnreachableVcs, &LocalFs)
        .status(&book)
        .unwrap();
    assert_eq!(status, DriftReport::Missing);
}

#[cfg(unix)]
#[test]
fn test_correct_link() {
    let shelf = TestShelf::new();
    shelf.symlink("../target", "links/foo");
    let book = Book::symbolic_link(shelf.path("links/foo"), "../target").unwrap();
    let reporter = DriftReporter::new(&UnreachableVcs, &LocalFs);

    let status = reporter.status(&book).unwrap();
    assert_eq!(
        status,
        DriftReport::Correct {
            target: "../target".to_string()
        }
    );
    assert!(status.is_ok());
    assert_eq!(
        reporter.diff(&book).unwrap(),
        DiffReport::Correct {
            target: "../target".to_string()
        }
    );
}

#[cfg(unix)]
#[test]
fn test_incorrect_link() {
    let shelf = TestShelf::new();
    shelf.symlink("/somewhere/else", "links/foo");
    let book = Book::symbolic_link(shelf.path("links/foo"), "../target").unwrap();
    let reporter = DriftReporter::new(&UnreachableVcs, &LocalFs);

    let status = reporter.status(&book).unwrap();
    assert_eq!(
        status,
        DriftReport::Incorrect {
            actual: "/somewhere/else".to_string(),
            expected: "../target".to_string(),
        }
    );
    assert_eq!(status.pending_action(&book), Some(PendingAction::Relink));
    assert_eq!(
        reporter.diff(&book).unwrap(),
        DiffReport::Incorrect {
            actual: "/somewhere/else".to_string(),
            expected: "../target".to_string(),
        }
    );
}

#[test]
fn test_report_serializes_with_state_tag() {
    let json = serde_json::to_value(DriftReport::WrongReference {
        actual: "master".to_string(),
        commit: "abc".to_string(),
        expected: "v1.0".to_string(),
    })
    .unwrap();

    assert_eq!(json["state"], "wrong-reference");
    assert_eq!(json["expected"], "v1.0");
}

#[test]
fn test_pending_action_display() {
    assert_eq!(PendingAction::Clone.to_string(), "clone");
    assert_eq!(PendingAction::FetchCheckout.to_string(), "fetch+checkout");
    assert_eq!(PendingAction::CreateLink.to_string(), "create link");
    assert_eq!(PendingAction::Relink.to_string(), "relink");
}
