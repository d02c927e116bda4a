// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deleting a directory tree with [`TreeDeleter`].
//!
//! Builds a small tree in a temporary directory, deletes it, and prints what
//! the deleter reports. Raise the subscriber level to `TRACE` to see each
//! removal.

use burrow::{DeleteOptions, TreeDeleter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("project");

    for module in ["core", "net", "storage"] {
        let src = root.join("src").join(module);
        std::fs::create_dir_all(&src)?;
        for i in 0..50 {
            std::fs::write(src.join(format!("part{i}.rs")), b"// generated\n")?;
        }
    }
    std::fs::create_dir_all(root.join("target/debug/deps"))?;

    let options = DeleteOptions::new().inner_clear_interval(64).dir_clear_interval(8);
    let stats = TreeDeleter::new(options).delete(&root)?;

    println!("removed {} files and {} directories", stats.files_removed, stats.dirs_removed);
    println!(
        "arena clears: inner {}, middle {}; peak paths: outer {}, middle {}, inner {}",
        stats.inner_clears, stats.middle_clears, stats.outer_peak, stats.middle_peak, stats.inner_peak
    );
    assert!(!root.exists());

    Ok(())
}
