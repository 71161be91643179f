use assert_cmd::Command;
use indexmap::IndexMap;

type Clusters = IndexMap<String, Vec<Vec<String>>>;

#[test]
fn command_cut() -> anyhow::Result<()> {
    let tempdir = tempfile::TempDir::new()?;
    let tree = tempdir.path().join("tree.nw");
    std::fs::write(
        &tree,
        "(Elk:8,((Dog:44,Cat:44):-24,(Bat:44,Ape:44):-24):-12);\n",
    )?;

    let mut cmd = Command::cargo_bin("nwclust")?;
    let output = cmd
        .arg("cut")
        .arg(&tree)
        .arg("--thresholds")
        .arg("tests/nwclust/thresholds.txt")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;

    let clusters: Clusters = serde_json::from_str(&stdout)?;
    let keys: Vec<_> = clusters.keys().cloned().collect();
    assert_eq!(keys, vec!["0", "20", "30", "45"]);

    assert_eq!(clusters["0"], vec![vec!["Ape", "Bat", "Cat", "Dog", "Elk"]]);
    assert_eq!(
        clusters["20"],
        vec![vec!["Ape", "Bat", "Cat", "Dog"], vec!["Elk"]]
    );
    assert_eq!(
        clusters["30"],
        vec![vec!["Ape", "Bat"], vec!["Cat", "Dog"], vec!["Elk"]]
    );
    assert_eq!(clusters["45"].len(), 5);

    // the bad line is reported, not fatal
    assert!(stderr.contains("not-a-number"));

    Ok(())
}

#[test]
fn command_cut_stdin() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("nwclust")?;
    let output = cmd
        .arg("cut")
        .arg("stdin")
        .arg("-t")
        .arg("tests/nwclust/thresholds.txt")
        .write_stdin("((X:10,Y:10):-6,Z:4);")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    let clusters: Clusters = serde_json::from_str(&stdout)?;
    assert_eq!(clusters["0"], vec![vec!["X", "Y", "Z"]]);
    assert_eq!(clusters["20"], vec![vec!["X"], vec!["Y"], vec!["Z"]]);

    Ok(())
}

#[test]
fn command_cut_bad_tree() -> anyhow::Result<()> {
    // lengths that put the parent at two heights
    let mut cmd = Command::cargo_bin("nwclust")?;
    let output = cmd
        .arg("cut")
        .arg("stdin")
        .arg("-t")
        .arg("tests/nwclust/thresholds.txt")
        .write_stdin("(A:1,B:2);")
        .output()?;
    assert!(!output.status.success());

    let mut cmd = Command::cargo_bin("nwclust")?;
    let output = cmd
        .arg("cut")
        .arg("stdin")
        .arg("-t")
        .arg("tests/nwclust/thresholds.txt")
        .write_stdin("(A:1,B:1)")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Parse error"));

    Ok(())
}
