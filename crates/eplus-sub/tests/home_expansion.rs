#![cfg(unix)]

use std::path::{Path, PathBuf};

use eplus_sub::expand_path;
use serial_test::serial;

#[test]
#[serial]
fn test_tilde_uses_home() {
    let previous = std::env::var_os("HOME");
    std::env::set_var("HOME", "/home/u");

    let expanded = expand_path(Some(Path::new("~/foo")));
    let bare = expand_path(Some(Path::new("~")));

    match previous {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }

    assert_eq!(expanded, Some(PathBuf::from("/home/u/foo")));
    assert_eq!(bare, Some(PathBuf::from("/home/u")));
}

#[test]
#[serial]
fn test_none_passes_through() {
    assert_eq!(expand_path(None), None);
}
