use std::net::TcpListener;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn free_addr() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.to_string())
}

#[test]
fn command_node_group() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let outfile = temp.path().join("out.txt");
    let scores = temp.path().join("scores.tsv");
    let addr = free_addr()?;
    let bin = assert_cmd::cargo::cargo_bin("psma");

    let mut children = vec![];
    for rank in 0..3 {
        let mut cmd = Command::new(&bin);
        cmd.arg("node")
            .arg("tests/psma/four.fa")
            .arg("--rank")
            .arg(rank.to_string())
            .arg("--size")
            .arg("3")
            .arg("--leader")
            .arg(&addr)
            .arg("-t")
            .arg("2")
            .env("PSMA_LOG_LEVEL", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if rank == 0 {
            cmd.arg("-o").arg(&outfile).arg("--scores").arg(&scores);
        }
        children.push(cmd.spawn()?);
    }

    for (rank, child) in children.into_iter().enumerate() {
        let output = child.wait_with_output()?;
        assert!(
            output.status.success(),
            "rank {}: {}",
            rank,
            String::from_utf8_lossy(&output.stderr)
        );
        // Only the leader writes anything
        assert!(output.stdout.is_empty());
    }

    let out = std::fs::read_to_string(&outfile)?;
    assert!(out.contains("#chains\t4\n"));
    assert_eq!(std::fs::read_to_string(&scores)?.lines().count(), 6);

    Ok(())
}

#[test]
fn command_node_bad_rank() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("psma")?;
    cmd.arg("node")
        .arg("tests/psma/four.fa")
        .arg("--rank")
        .arg("3")
        .arg("--size")
        .arg("3")
        .arg("--leader")
        .arg("127.0.0.1:1")
        .assert()
        .failure();

    Ok(())
}
