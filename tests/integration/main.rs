//! Integration tests for Fryer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;

    const TOOL_SHA256: &str = "b0335dc5c19f374fb20d56c5e3764727a1dc64df38c0a2f4239d35a6ef4a3e82";

    /// Fryer with a config path that never exists
    fn fryer(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("fryer");
        cmd.env("FRYER_CONFIG", dir.path().join("no-config.toml"));
        cmd
    }

    fn write_recipe(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("recipe.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = tar::Archive::new(file);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().into_owned();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (name, data)
            })
            .collect()
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        fryer(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Cook packages inside containers from checksummed remote sources",
            ));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        fryer(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("fryer"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        fryer(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no-config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        fryer(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[engine]"))
            .stdout(predicate::str::contains("max_redirects = 3"));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[fetch]\nmax_redirects = \"lots\"\n").unwrap();

        cargo_bin_cmd!("fryer")
            .env("FRYER_CONFIG", &config)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn context_without_source() {
        let dir = TempDir::new().unwrap();
        let recipe = write_recipe(
            &dir,
            "[build_depends]\nmake = {}\n\n[[steps]]\nname = \"hello\"\ncommand = \"echo hi\"\n",
        );
        let out = dir.path().join("ctx.tar");

        fryer(&dir)
            .arg("context")
            .arg("--recipe")
            .arg(&recipe)
            .args(["--image", "debian:12", "--flavour", "debian"])
            .arg("--output")
            .arg(&out)
            .assert()
            .success();

        let listed = entries(&out);
        let names: Vec<_> = listed.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![".build.sh", "Dockerfile"]);
        let dockerfile = String::from_utf8(listed[1].1.clone()).unwrap();
        assert!(dockerfile.starts_with("FROM debian:12\n"));
        assert!(dockerfile.contains("RUN apt-get install --yes make"));
        let script = String::from_utf8(listed[0].1.clone()).unwrap();
        assert!(script.contains("echo hi"));
    }

    #[test]
    fn context_with_remote_source() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/tool.bin")
            .with_status(200)
            .with_body("tool bytes")
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let recipe = write_recipe(
            &dir,
            &format!(
                "[source]\nurl = \"{}/tool.bin\"\nchecksum = \"sha256:{}\"\n\
                 files = [{{ from = \"tool.bin\", to = \"bin\" }}]\n",
                server.url(),
                TOOL_SHA256
            ),
        );
        let out = dir.path().join("ctx.tar");
        let cache = dir.path().join("cache");

        for _ in 0..2 {
            fryer(&dir)
                .arg("context")
                .arg("--recipe")
                .arg(&recipe)
                .args(["--image", "busybox"])
                .arg("--cache-dir")
                .arg(&cache)
                .arg("--output")
                .arg(&out)
                .assert()
                .success();
        }

        // The second run finds a matching local file
        mock.assert();

        let listed = entries(&out);
        let names: Vec<_> = listed.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![".build.sh", "Dockerfile", "tool.bin"]);
        assert_eq!(listed[2].1, b"tool bytes");
        let dockerfile = String::from_utf8(listed[1].1.clone()).unwrap();
        assert!(dockerfile.contains("ADD tool.bin /tmp/build/bin\n"));
    }

    #[test]
    fn context_to_stdout() {
        let dir = TempDir::new().unwrap();
        let recipe = write_recipe(&dir, "");

        let output = fryer(&dir)
            .arg("context")
            .arg("--recipe")
            .arg(&recipe)
            .args(["--image", "busybox"])
            .output()
            .unwrap();

        assert!(output.status.success());
        // Two generated entries plus the end-of-archive marker
        assert_eq!(output.stdout.len() % 512, 0);
        let mut archive = tar::Archive::new(&output.stdout[..]);
        assert_eq!(archive.entries().unwrap().count(), 2);
    }

    #[test]
    fn unknown_flavour_fails() {
        let dir = TempDir::new().unwrap();
        let recipe = write_recipe(&dir, "[build_depends]\ngcc = {}\n");

        fryer(&dir)
            .arg("context")
            .arg("--recipe")
            .arg(&recipe)
            .args(["--image", "alpine", "--flavour", "alpine"])
            .arg("--output")
            .arg(dir.path().join("ctx.tar"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown flavour: alpine"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn fetch_checksum_mismatch_fails() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/src.tar")
            .with_status(200)
            .with_body("not what you expected")
            .create();
        let dir = TempDir::new().unwrap();

        fryer(&dir)
            .arg("fetch")
            .arg("--url")
            .arg(format!("{}/src.tar", server.url()))
            .arg("--checksum")
            .arg(format!("sha256:{}", "0".repeat(64)))
            .arg("--cache-dir")
            .arg(dir.path().join("cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Checksum failed"));
    }

    #[test]
    fn fetch_prints_cachekey() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/src.tar")
            .with_status(200)
            .with_body("abc")
            .create();
        let dir = TempDir::new().unwrap();

        // sha256("abc")
        fryer(&dir)
            .arg("fetch")
            .arg("--url")
            .arg(format!("{}/src.tar", server.url()))
            .arg("--cache-dir")
            .arg(dir.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ));
    }

    #[test]
    fn unknown_checksum_algorithm_fails() {
        let dir = TempDir::new().unwrap();
        fryer(&dir)
            .args(["fetch", "--url", "http://example.com/a.tar", "--checksum", "md5:abc"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown checksum algorithm"));
    }
}
