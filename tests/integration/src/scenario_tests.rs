//! Scenario tests
//!
//! Whole workflows across the crates: manifest file to shelf to backend to
//! filesystem, run against both VCS backends where it matters.

use std::fs;
use std::time::Duration;

use rstest::rstest;
use shelf_core::{
    BookOptions, DriftReport, Error, Manifest, ManifestOptions, PendingAction, RunOptions, Shelf,
    Step,
};
use shelf_fs::{LocalFs, NormalizedPath};
use shelf_git::{GitCliBackend, LibGitBackend, RetryingBackend, VcsBackend};
use shelf_test_utils::counting::CountingVcs;
use shelf_test_utils::git::{FIRST_TAG, SIDE_BRANCH, git_available};
use shelf_test_utils::shelf::TestShelf;

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Backend {
    LibGit,
    Cli,
}

fn backend(kind: Backend) -> Option<Box<dyn VcsBackend>> {
    match kind {
        Backend::LibGit => Some(Box::new(LibGitBackend::new())),
        Backend::Cli if git_available() => Some(Box::new(GitCliBackend::new())),
        Backend::Cli => {
            eprintln!("git executable not found, skipping");
            None
        }
    }
}

/// Load the workspace manifest with every absolute book path moved under
/// the workspace root.
fn load(shelf: &TestShelf, options: &ManifestOptions) -> Shelf {
    let manifest = Manifest::load(&shelf.root().join("gitshelf.yml"), options).unwrap();
    let book_options = BookOptions {
        fakeroot: Some(NormalizedPath::new(shelf.root())),
        ..Default::default()
    };
    Shelf::from_entries(&manifest.books, &book_options)
}

// =============================================================================
// Install
// =============================================================================

mod install {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::libgit(Backend::LibGit)]
    #[case::cli(Backend::Cli)]
    fn test_manifest_with_every_reference_kind(#[case] kind: Backend) {
        let Some(vcs) = backend(kind) else { return };
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        shelf.write_manifest(&format!(
            r#"
environments:
  dev:
    tokens:
      src: "{url}"
books:
  - book: /libs/on-branch
    git: "{{src}}"
  - book: /libs/on-tag
    git: "{{src}}"
    branch: {tag}
  - book: /libs/on-side-branch
    git: "{{src}}"
    branch: {side}
  - book: /libs/on-commit
    git: "{{src}}"
    branch: "{commit}"
  - book: /links/tagged
    link: /libs/on-tag
"#,
            url = upstream.url(),
            tag = FIRST_TAG,
            side = SIDE_BRANCH,
            commit = upstream.first_commit,
        ));

        let books = load(&shelf, &ManifestOptions::default());
        assert!(books.rejected().is_empty());

        let report = books.install(vcs.as_ref(), &LocalFs, &RunOptions::default()).unwrap();
        assert!(report.is_success(), "failures: {:?}", report.failures().collect::<Vec<_>>());

        shelf.assert_head("libs/on-branch", &upstream.second_commit);
        shelf.assert_head("libs/on-tag", &upstream.first_commit);
        shelf.assert_head("libs/on-side-branch", &upstream.first_commit);
        shelf.assert_head("libs/on-commit", &upstream.first_commit);
        #[cfg(unix)]
        shelf.assert_symlink("links/tagged", "../libs/on-tag");

        let status = books.status(vcs.as_ref(), &LocalFs, &RunOptions::default()).unwrap();
        for (book, state) in status.successes() {
            assert!(state.is_ok(), "{book} is {state:?}");
        }
    }

    #[test]
    fn test_parallel_install_matches_sequential() {
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        let mut yaml = String::from("books:\n");
        for i in 0..8 {
            let branch = if i % 2 == 0 { "master" } else { FIRST_TAG };
            yaml.push_str(&format!(
                "  - book: /libs/b{i}\n    git: \"{}\"\n    branch: {branch}\n",
                upstream.url()
            ));
        }
        shelf.write_manifest(&yaml);
        let books = load(&shelf, &ManifestOptions::default());

        let vcs = CountingVcs::new(LibGitBackend::new());
        let report = books.install(&vcs, &LocalFs, &RunOptions { jobs: 4 }).unwrap();
        assert!(report.is_success());

        let paths: Vec<String> = report.outcomes.iter().map(|o| o.book.to_string()).collect();
        let expected: Vec<String> = (0..8)
            .map(|i| NormalizedPath::new(shelf.path(&format!("libs/b{i}"))).to_string())
            .collect();
        assert_eq!(paths, expected);

        vcs.counts.reset();
        let again = books.install(&vcs, &LocalFs, &RunOptions { jobs: 4 }).unwrap();
        assert!(again.successes().all(|(_, r)| r.is_unchanged()));
        assert_eq!(vcs.counts.mutations(), 0);
    }

    #[test]
    fn test_upstream_moves_and_pinned_book_follows() {
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        let manifest = |reference: &str| {
            shelf.write_manifest(&format!(
                "books:\n  - book: /libs/foo\n    git: \"{}\"\n    branch: \"{reference}\"\n",
                upstream.url()
            ));
        };
        let vcs = LibGitBackend::new();

        manifest(&upstream.second_commit);
        let books = load(&shelf, &ManifestOptions::default());
        assert!(books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap().is_success());

        let third = upstream.advance("third\n");
        manifest(&third);
        let books = load(&shelf, &ManifestOptions::default());
        let plan = books.plan(&vcs, &LocalFs, &RunOptions::default()).unwrap();
        assert_eq!(
            plan.successes().map(|(_, a)| *a).collect::<Vec<_>>(),
            vec![Some(PendingAction::FetchCheckout)]
        );

        assert!(books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap().is_success());
        shelf.assert_head("libs/foo", &third);
    }
}

// =============================================================================
// Drift
// =============================================================================

mod drift {
    use super::*;

    #[test]
    fn test_local_edits_survive_install() {
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        shelf.write_manifest(&format!("books:\n  - book: /libs/foo\n    git: \"{}\"\n", upstream.url()));
        let books = load(&shelf, &ManifestOptions::default());
        let vcs = LibGitBackend::new();
        books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap();

        fs::write(shelf.path("libs/foo/NOTES.txt"), "scratch\n").unwrap();
        let report = books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap();
        assert!(report.successes().all(|(_, r)| r.is_unchanged()));

        let status = books.status(&vcs, &LocalFs, &RunOptions::default()).unwrap();
        let states: Vec<&DriftReport> = status.successes().map(|(_, s)| s).collect();
        assert!(matches!(states[0], DriftReport::Dirty { changes } if changes.iter().any(|c| c.contains("NOTES.txt"))));
    }

    #[cfg(unix)]
    #[test]
    fn test_hand_edited_link_is_restored() {
        let shelf = TestShelf::new();
        shelf.mkdir("data/v1");
        shelf.mkdir("data/v2");
        shelf.write_manifest("books:\n  - book: /current\n    link: /data/v2\n");
        let books = load(&shelf, &ManifestOptions::default());
        shelf.symlink("data/v1", "current");

        let vcs = LibGitBackend::new();
        let status = books.status(&vcs, &LocalFs, &RunOptions::default()).unwrap();
        assert!(matches!(
            status.successes().next().map(|(_, s)| s),
            Some(DriftReport::Incorrect { .. })
        ));

        books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap();
        shelf.assert_symlink("current", "data/v2");
    }
}

// =============================================================================
// Discovery round trip
// =============================================================================

mod discovery {
    use super::*;
    use pretty_assertions::assert_eq;
    use shelf_core::{Discoverer, render_manifest};

    #[cfg(unix)]
    #[test]
    fn test_discovered_tree_reinstalls_elsewhere() {
        let source = TestShelf::new();
        let upstream = source.upstream("foo");
        source.write_manifest(&format!(
            "books:\n  - book: /libs/foo\n    git: \"{url}\"\n    branch: {tag}\n  - book: /libs/bar\n    git: \"{url}\"\n  - book: /links/foo\n    link: /libs/foo\n",
            url = upstream.url(),
            tag = FIRST_TAG,
        ));
        let vcs = LibGitBackend::new();
        load(&source, &ManifestOptions::default())
            .install(&vcs, &LocalFs, &RunOptions::default())
            .unwrap();

        let mut found = Discoverer::new(&vcs, &LocalFs).discover(&source.root(), false);
        assert!(found.failures.is_empty());
        found.sort();

        let target = TestShelf::new();
        target.write_manifest(&render_manifest(&found.books).unwrap());
        let books = load(&target, &ManifestOptions::default());
        assert_eq!(books.books().len(), 3);
        assert!(books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap().is_success());

        target.assert_head("libs/foo", &upstream.first_commit);
        target.assert_head("libs/bar", &upstream.second_commit);
        target.assert_symlink("links/foo", "../libs/foo");
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unreachable_remote_is_retried_then_reported() {
        let shelf = TestShelf::new();
        shelf.write_manifest(&format!(
            "books:\n  - book: /libs/gone\n    git: \"{}\"\n",
            shelf.path("no-such-upstream").display()
        ));
        let books = load(&shelf, &ManifestOptions::default());

        let vcs = RetryingBackend::new(CountingVcs::new(LibGitBackend::new()), 3)
            .with_initial_interval(Duration::from_millis(1));
        let report = books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap();

        assert_eq!(report.failed(), 1);
        let (_, error) = report.failures().next().unwrap();
        assert!(
            matches!(error, Error::Backend { step: Step::Clone, .. }),
            "unexpected error: {error}"
        );
        assert_eq!(vcs.inner().counts.mutations(), 3);
    }

    #[test]
    fn test_cli_timeout_surfaces_as_backend_timeout() {
        if !git_available() {
            eprintln!("git executable not found, skipping");
            return;
        }
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        shelf.write_manifest(&format!("books:\n  - book: /libs/foo\n    git: \"{}\"\n", upstream.url()));
        let books = load(&shelf, &ManifestOptions::default());

        // Any real clone takes longer than a nanosecond.
        let vcs = GitCliBackend::new().with_timeout(Duration::from_nanos(1));
        let report = books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap();

        let (_, error) = report.failures().next().unwrap();
        assert!(
            matches!(error, Error::BackendTimeout { step: Step::Clone, .. }),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn test_token_override_and_environment_selection() {
        let shelf = TestShelf::new();
        let upstream = shelf.upstream("foo");
        shelf.write_manifest(
            "defaults:\n  environment: a\nenvironments:\n  a:\n    tokens:\n      ref: master\n  b:\n    tokens:\n      ref: v1.0\nbooks:\n  - book: /libs/foo\n    git: \"{src}\"\n    branch: \"{ref}\"\n",
        );
        let options = ManifestOptions {
            environment: Some("b".to_string()),
            tokens: [("src".to_string(), upstream.url())].into_iter().collect(),
        };

        let books = load(&shelf, &options);
        let vcs = LibGitBackend::new();
        assert!(books.install(&vcs, &LocalFs, &RunOptions::default()).unwrap().is_success());
        shelf.assert_head("libs/foo", &upstream.first_commit);
    }
}
