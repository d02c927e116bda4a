// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reading, rewinding and patching a file through a [`BufferedFile`].
//!
//! The relative seek below is measured from the position the program has
//! read up to, even though the buffer has already pulled in the rest of the
//! file.

use burrow::{OpenMode, Whence};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("scores.txt");
    std::fs::write(&path, "alice 10\nbob 7\ncarol 12\n")?;

    let mode: OpenMode = "r+".parse()?;
    let mut file = mode.options().open(&path)?;

    let first = file.read_line()?.unwrap_or_default();
    println!("first line: {}", String::from_utf8_lossy(&first));

    let after_first = file.seek(Whence::Cur, 0)?;
    println!("logical position after one line: {after_first}");

    // Step back over "7\n" of bob's line and overwrite the score.
    let second = file.read_line()?.unwrap_or_default();
    let back = i64::try_from(second.len() + 1)? - 4;
    file.seek(Whence::Cur, -back)?;
    let score = file.read_number()?;
    println!("bob's score was {score:?}");

    file.seek(Whence::Cur, -1)?;
    file.write("9")?;

    file.seek(Whence::Set, 0)?;
    let contents = file.read_to_end()?;
    print!("{}", String::from_utf8_lossy(&contents));

    file.close()?;
    Ok(())
}
