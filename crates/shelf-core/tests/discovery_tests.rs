//! Tests for synthesizing books from an existing tree.

use pretty_assertions::assert_eq;
use shelf_core::{
    Book, BookKind, BookOptions, Discoverer, Error, Manifest, ManifestOptions, Reconciler, Shelf,
    render_manifest,
};
use shelf_fs::{LocalFs, NormalizedPath};
use shelf_git::{LibGitBackend, VcsBackend};
use shelf_test_utils::git::{add_remote, commit_file, head_commit, init_repo};
use shelf_test_utils::shelf::TestShelf;

fn clone_into(shelf: &TestShelf, rel: &str, url: &str) {
    LibGitBackend::new().clone_repo(url, &shelf.path(rel)).unwrap();
}

fn local_repo(shelf: &TestShelf, rel: &str) {
    let repo = init_repo(&shelf.path(rel));
    commit_file(&repo, "README.md", "local\n", "Initial commit");
}

fn find<'a>(books: &'a [Book], path: &str) -> &'a Book {
    books
        .iter()
        .find(|book| book.path().as_str() == path)
        .unwrap_or_else(|| panic!("no book at {path}"))
}

fn remote_of(book: &Book) -> &str {
    match book.kind() {
        BookKind::GitRepo { remote_url, .. } => remote_url,
        BookKind::SymbolicLink { .. } => panic!("{book} is a link"),
    }
}

fn reference_of(book: &Book) -> &str {
    match book.kind() {
        BookKind::GitRepo { reference, .. } => reference,
        BookKind::SymbolicLink { .. } => panic!("{book} is a link"),
    }
}

#[test]
fn test_origin_is_preferred() {
    let shelf = TestShelf::new();
    let u1 = shelf.upstream("u1");
    let u2 = shelf.upstream("u2");
    clone_into(&shelf, "a", &u1.url());
    add_remote(&shelf.path("a"), "other", &u2.url());

    let vcs = LibGitBackend::new();
    let report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    assert_eq!(report.books.len(), 1);
    let book = find(&report.books, "a");
    assert_eq!(remote_of(book), u1.url());
    assert_eq!(reference_of(book), u1.second_commit);
}

#[test]
fn test_use_branch_records_description() {
    let shelf = TestShelf::new();
    let upstream = shelf.upstream("u1");
    clone_into(&shelf, "libs/a", &upstream.url());

    let vcs = LibGitBackend::new();
    let report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), true);

    assert_eq!(reference_of(find(&report.books, "libs/a")), "master");
}

#[test]
fn test_first_remote_by_name_without_origin() {
    let shelf = TestShelf::new();
    local_repo(&shelf, "a");
    add_remote(&shelf.path("a"), "zeta", "https://example.com/zeta.git");
    add_remote(&shelf.path("a"), "alpha", "https://example.com/alpha.git");

    let vcs = LibGitBackend::new();
    let report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);

    assert_eq!(remote_of(find(&report.books, "a")), "https://example.com/alpha.git");
}

#[test]
fn test_repository_without_remote_does_not_stop_discovery() {
    let shelf = TestShelf::new();
    let upstream = shelf.upstream("u1");
    local_repo(&shelf, "orphan");
    clone_into(&shelf, "good", &upstream.url());

    let vcs = LibGitBackend::new();
    let report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);

    assert_eq!(report.books.len(), 1);
    find(&report.books, "good");
    assert_eq!(report.failures.len(), 1);
    assert!(
        matches!(&report.failures[0], Error::NoRemoteConfigured { repo } if repo.as_str() == "orphan"),
        "unexpected failure: {}",
        report.failures[0]
    );
}

#[test]
fn test_root_repository_is_ignored() {
    let shelf = TestShelf::new();
    local_repo(&shelf, ".");

    let vcs = LibGitBackend::new();
    let report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);

    assert!(report.books.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn test_nested_repositories_are_found() {
    let shelf = TestShelf::new();
    let upstream = shelf.upstream("u1");
    clone_into(&shelf, "outer", &upstream.url());
    clone_into(&shelf, "outer/vendor/inner", &upstream.url());

    let vcs = LibGitBackend::new();
    let mut report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);
    report.sort();

    let paths: Vec<&str> = report.books.iter().map(|b| b.path().as_str()).collect();
    assert_eq!(paths, vec!["outer", "outer/vendor/inner"]);
}

#[cfg(unix)]
#[test]
fn test_symlink_target_is_literal() {
    let shelf = TestShelf::new();
    shelf.symlink("../x/y", "links/l");
    shelf.symlink("/does/not/exist", "dangling");

    let vcs = LibGitBackend::new();
    let mut report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);
    report.sort();

    assert_eq!(
        report.books,
        vec![
            Book::symbolic_link("dangling", "/does/not/exist").unwrap(),
            Book::symbolic_link("links/l", "../x/y").unwrap(),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_symlink_target_keeps_backslashes_and_trailing_slash() {
    let shelf = TestShelf::new();
    shelf.symlink("a\\b", "links/odd");
    shelf.symlink("../dir/", "links/dir");

    let vcs = LibGitBackend::new();
    let mut report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);
    report.sort();

    let links: Vec<Option<String>> = report.books.iter().map(|b| b.to_entry().link).collect();
    assert_eq!(links, vec![Some("../dir/".to_string()), Some("a\\b".to_string())]);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_not_descended() {
    let shelf = TestShelf::new();
    let upstream = shelf.upstream("u1");
    clone_into(&shelf, "real", &upstream.url());
    shelf.symlink("real", "alias");

    let vcs = LibGitBackend::new();
    let mut report = Discoverer::new(&vcs, &LocalFs).discover(&shelf.root(), false);
    report.sort();

    let paths: Vec<&str> = report.books.iter().map(|b| b.path().as_str()).collect();
    assert_eq!(paths, vec!["alias", "real"]);
    assert!(!find(&report.books, "alias").is_git_repo());
}

#[test]
fn test_discovered_manifest_reproduces_the_tree() {
    let source = TestShelf::new();
    let upstream = source.upstream("u1");
    clone_into(&source, "libs/a", &upstream.url());
    let vcs = LibGitBackend::new();
    vcs.checkout(&source.path("libs/a"), &upstream.first_commit).unwrap();

    let mut report = Discoverer::new(&vcs, &LocalFs).discover(&source.root(), false);
    report.sort();
    let yaml = render_manifest(&report.books).unwrap();

    let manifest = Manifest::parse(&yaml, &ManifestOptions::default()).unwrap();
    let target = TestShelf::new();
    let options = BookOptions {
        fakeroot: Some(NormalizedPath::new(target.root())),
        ..Default::default()
    };
    let shelf = Shelf::from_entries(&manifest.books, &options);
    assert!(shelf.rejected().is_empty());

    let reconciler = Reconciler::new(&vcs, &LocalFs);
    for book in shelf.books() {
        reconciler.reconcile(book).unwrap();
    }

    assert_eq!(
        head_commit(&target.path("libs/a")),
        head_commit(&source.path("libs/a"))
    );
    target.assert_head("libs/a", &upstream.first_commit);
}
