// tests/pipeline.rs

//! Bundle install pipeline tests: extract, verify, reconcile, plan, commit.

mod common;

use common::{foo_backend, foo_bundle, Workspace};
use onbundle::{
    BundlePath, DependencyGroup, Error, MemoryBackend, PackageBackend, ProgressTracker,
    SilentProgress, VersionVerdict,
};

#[test]
fn test_end_to_end_foo_bundle() {
    let ws = Workspace::new();
    let (bundle, tree) = ws.build_and_extract(foo_bundle());
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = foo_backend(&ws.cache);

    let report = onbundle::check_sums(&bundle, &tree).unwrap();
    assert!(report.all_passed());
    assert_eq!(report.len(), 2);

    let check = onbundle::check_version(&backend, &main.bundle_name()).unwrap();
    assert_eq!(check.verdict, VersionVerdict::Newer);

    let checks = onbundle::check_version_all(&backend, &main, &tree).unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].bundle_name, "bar_1.0");
    assert_eq!(checks[0].verdict, VersionVerdict::Same);

    let plan = onbundle::mark_install(&mut backend, &main, &tree).unwrap();
    let shown: Vec<_> = plan.iter().map(|c| c.to_string()).collect();
    assert_eq!(shown, vec!["foo_2.0", "bar_1.0"]);

    assert!(ws.cached("bar_1.0.deb"));
    assert!(!ws.cached("foo_2.0.deb"));
    assert!(backend.is_marked("foo"));
    assert!(backend.is_marked("bar"));

    let progress = SilentProgress::new();
    onbundle::commit_install(&mut backend, &plan, &progress).unwrap();
    assert_eq!(
        backend.committed(),
        &[vec!["foo".to_string(), "bar".to_string()]]
    );
    assert!(backend.lookup("bar").unwrap().installed);
    assert!(progress.is_finished());
}

#[test]
fn test_everything_installed_plans_nothing() {
    let ws = Workspace::new();
    let (bundle, tree) = ws.build_and_extract(foo_bundle());
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = MemoryBackend::new(&ws.cache)
        .with_package("foo", "2.0", true, vec![DependencyGroup::new(["bar"])])
        .with_installed("bar", "1.0");

    let plan = onbundle::mark_install(&mut backend, &main, &tree).unwrap();
    assert!(plan.is_empty());
    assert_eq!(std::fs::read_dir(&ws.cache).unwrap().count(), 0);
    assert!(backend.pending_changes().is_empty());
}

#[test]
fn test_mark_install_twice_conflicts() {
    let ws = Workspace::new();
    let (bundle, tree) = ws.build_and_extract(foo_bundle());
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = foo_backend(&ws.cache);

    onbundle::mark_install(&mut backend, &main, &tree).unwrap();
    let err = onbundle::mark_install(&mut backend, &main, &tree).unwrap_err();
    match err {
        Error::CopyConflict(path) => assert!(path.ends_with("bar_1.0.deb")),
        other => panic!("expected CopyConflict, got {:?}", other),
    }
}

#[test]
fn test_or_group_alternatives_all_staged() {
    let ws = Workspace::new();
    let bundle = foo_bundle().payload_bytes("baz_0.3_amd64.deb", b"baz".to_vec());
    let (bundle, tree) = ws.build_and_extract(bundle);
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = MemoryBackend::new(&ws.cache)
        .with_package(
            "foo",
            "1.0",
            false,
            vec![DependencyGroup::new(["baz", "bar"]), DependencyGroup::new(["bar"])],
        )
        .with_available("bar", "1.0")
        .with_available("baz", "0.2");

    let checks = onbundle::check_version_all(&backend, &main, &tree).unwrap();
    let names: Vec<_> = checks.iter().map(|c| c.bundle_name.as_str()).collect();
    assert_eq!(names, vec!["baz_0.3_amd64", "bar_1.0", "bar_1.0"]);

    let plan = onbundle::mark_install(&mut backend, &main, &tree).unwrap();
    assert_eq!(plan.names(), vec!["foo", "baz", "bar"]);
    assert!(ws.cached("baz_0.3_amd64.deb"));
    assert!(ws.cached("bar_1.0.deb"));
}

#[test]
fn test_unknown_main_package() {
    let ws = Workspace::new();
    let (bundle, tree) = ws.build_and_extract(foo_bundle());
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = MemoryBackend::new(&ws.cache);

    assert!(matches!(
        onbundle::check_version(&backend, "foo_2.0").unwrap_err(),
        Error::Lookup(_)
    ));
    assert!(matches!(
        onbundle::mark_install(&mut backend, &main, &tree).unwrap_err(),
        Error::Lookup(_)
    ));
}

#[test]
fn test_commit_skips_packages_missing_from_index() {
    struct ShrinkingBackend {
        inner: MemoryBackend,
    }

    impl PackageBackend for ShrinkingBackend {
        fn lookup(&self, name: &str) -> onbundle::Result<onbundle::PackageInfo> {
            self.inner.lookup(name)
        }
        fn contains(&self, name: &str) -> bool {
            name != "bar"
        }
        fn compare_versions(&self, a: &str, b: &str) -> std::cmp::Ordering {
            self.inner.compare_versions(a, b)
        }
        fn mark_install(&mut self, name: &str) -> onbundle::Result<()> {
            self.inner.mark_install(name)
        }
        fn cache_dir(&self) -> onbundle::Result<std::path::PathBuf> {
            self.inner.cache_dir()
        }
        fn pending_changes(&self) -> Vec<onbundle::PackageInfo> {
            self.inner.pending_changes()
        }
        fn commit(
            &mut self,
            names: &[String],
            progress: &dyn onbundle::ProgressTracker,
        ) -> onbundle::Result<()> {
            self.inner.commit(names, progress)
        }
    }

    let ws = Workspace::new();
    let (bundle, tree) = ws.build_and_extract(foo_bundle());
    let main = BundlePath::new(&bundle).unwrap();
    let mut backend = ShrinkingBackend {
        inner: foo_backend(&ws.cache),
    };

    let plan = onbundle::mark_install(&mut backend, &main, &tree).unwrap();
    onbundle::commit_install(&mut backend, &plan, &SilentProgress::new()).unwrap();
    assert_eq!(backend.inner.committed(), &[vec!["foo".to_string()]]);
}
