//! Disk cache behavior against a real (temporary) directory

use mapposter::cache::{cache_key, ArtifactCache, DiskCache};
use mapposter::mapper::Layer;

#[test]
fn disk_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::new(dir.path());

    let key = cache_key("Lyon, France", &[Layer::streets()]);
    assert!(cache.load(&key).unwrap().is_none());

    cache.store(&key, b"png bytes").unwrap();
    assert_eq!(cache.load(&key).unwrap().as_deref(), Some(&b"png bytes"[..]));

    // The artifact lands as <key>.png under the root
    assert!(dir.path().join(format!("{key}.png")).exists());
}

#[test]
fn disk_cache_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let key = cache_key("Paris", &[Layer::streets()]);

    DiskCache::new(dir.path()).store(&key, b"first").unwrap();
    let reopened = DiskCache::new(dir.path());
    assert_eq!(reopened.load(&key).unwrap().as_deref(), Some(&b"first"[..]));
}

#[test]
fn store_creates_the_root_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("cache").join("rasters");
    let cache = DiskCache::new(&nested);

    let key = cache_key("Lyon", &[Layer::streets()]);
    cache.store(&key, b"x").unwrap();
    assert!(nested.exists());
}
