use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// Wireless network utility invoked for every command.
pub const NETSH: &str = "netsh";

static SSID_LINE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*SSID \d+ : (.*?)\s*$")
        .map_err(|err| log::warn!("invalid SSID pattern: {err}"))
        .ok()
});

/// Exit status and captured stdout of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
}

/// Runs external programs on behalf of the Wi-Fi helper.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands with `tokio::process`, no shell involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Lists nearby networks and joins WPA2-PSK networks via `netsh wlan`.
#[derive(Clone)]
pub struct WifiService {
    runner: Arc<dyn CommandRunner>,
    profile_dir: PathBuf,
}

impl WifiService {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            profile_dir: profile_dir.into(),
        }
    }

    /// Real commands, profiles written to the system temp directory.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemCommandRunner), std::env::temp_dir())
    }

    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// SSIDs in the order the utility reports them. Any failure yields an
    /// empty list.
    pub async fn list_networks(&self) -> Vec<String> {
        let args = to_args(&["wlan", "show", "networks", "mode=bssid"]);
        match self.runner.run(NETSH, &args).await {
            Ok(output) if output.success => parse_ssids(&output.stdout),
            Ok(_) => {
                log::warn!("network scan exited unsuccessfully");
                Vec::new()
            }
            Err(err) => {
                log::warn!("network scan failed: {err}");
                Vec::new()
            }
        }
    }

    /// Register a profile for `ssid` and connect to it.
    ///
    /// Returns `true` only when the connect command succeeds. A failure to
    /// add the profile is logged and the connect is still attempted.
    pub async fn connect(&self, ssid: &str, password: &str) -> bool {
        let path = self.profile_path(ssid);
        if let Err(err) = tokio::fs::write(&path, profile_xml(ssid, password)).await {
            log::warn!("cannot write wifi profile {}: {err}", path.display());
            return false;
        }

        let add = vec![
            "wlan".to_string(),
            "add".to_string(),
            "profile".to_string(),
            format!("filename={}", path.display()),
        ];
        match self.runner.run(NETSH, &add).await {
            Ok(output) if !output.success => log::warn!("adding wifi profile for {ssid} failed"),
            Err(err) => log::warn!("adding wifi profile for {ssid} failed: {err}"),
            Ok(_) => {}
        }
        if let Err(err) = tokio::fs::remove_file(&path).await {
            log::debug!("leaving wifi profile {}: {err}", path.display());
        }

        let connect = vec![
            "wlan".to_string(),
            "connect".to_string(),
            format!("name={ssid}"),
        ];
        match self.runner.run(NETSH, &connect).await {
            Ok(output) => {
                if !output.success {
                    log::warn!("connecting to {ssid} failed");
                }
                output.success
            }
            Err(err) => {
                log::warn!("connecting to {ssid} failed: {err}");
                false
            }
        }
    }

    fn profile_path(&self, ssid: &str) -> PathBuf {
        self.profile_dir.join(format!("{}.xml", profile_file_stem(ssid)))
    }
}

impl std::fmt::Debug for WifiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiService")
            .field("profile_dir", &self.profile_dir)
            .finish_non_exhaustive()
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_string()).collect()
}

/// Extract `SSID <n> : <name>` values, skipping `BSSID` lines and hidden
/// networks with an empty name.
#[must_use]
pub fn parse_ssids(stdout: &str) -> Vec<String> {
    let Some(pattern) = SSID_LINE.as_ref() else {
        return Vec::new();
    };
    pattern
        .captures_iter(stdout)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// WPA2-PSK / AES profile with a plain passphrase.
#[must_use]
pub fn profile_xml(ssid: &str, password: &str) -> String {
    let ssid = escape_xml(ssid);
    let password = escape_xml(password);
    format!(
        r#"<?xml version="1.0"?>
<WLANProfile xmlns="http://www.microsoft.com/networking/WLAN/profile/v1">
  <name>{ssid}</name>
  <SSIDConfig><SSID><name>{ssid}</name></SSID></SSIDConfig>
  <connectionType>ESS</connectionType>
  <connectionMode>auto</connectionMode>
  <MSM>
    <security>
      <authEncryption>
        <authentication>WPA2PSK</authentication>
        <encryption>AES</encryption>
        <useOneX>false</useOneX>
      </authEncryption>
      <sharedKey>
        <keyType>passPhrase</keyType>
        <protected>false</protected>
        <keyMaterial>{password}</keyMaterial>
      </sharedKey>
    </security>
  </MSM>
</WLANProfile>
"#
    )
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn profile_file_stem(ssid: &str) -> String {
    let stem: String = ssid
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "wifi-profile".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRunner {
        responses: Mutex<Vec<io::Result<CommandOutput>>>,
        calls: Mutex<Vec<Vec<String>>>,
        profiles: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn replying(responses: Vec<io::Result<CommandOutput>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                ..Self::default()
            })
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
            assert_eq!(program, NETSH);
            if let Some(path) = args.iter().find_map(|arg| arg.strip_prefix("filename=")) {
                let xml = std::fs::read_to_string(path).unwrap();
                self.profiles.lock().unwrap().push(xml);
            }
            self.calls.lock().unwrap().push(args.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
        }
    }

    fn ok(stdout: &str) -> io::Result<CommandOutput> {
        Ok(CommandOutput {
            success: true,
            stdout: stdout.to_string(),
        })
    }

    fn failed() -> io::Result<CommandOutput> {
        Ok(CommandOutput {
            success: false,
            stdout: String::new(),
        })
    }

    const SCAN: &str = "\r\nInterface name : Wi-Fi\r\nThere are 3 networks currently visible.\r\n\r\n\
SSID 1 : HomeNet\r\n    Network type            : Infrastructure\r\n    BSSID 1                 : aa:bb:cc:dd:ee:ff\r\n\
\r\nSSID 2 : \r\n    Network type            : Infrastructure\r\n\
\r\nSSID 3 : Cafe Guest\r\n    BSSID 1                 : 11:22:33:44:55:66\r\n";

    #[test]
    fn parses_ssids_and_skips_bssid_and_hidden() {
        assert_eq!(parse_ssids(SCAN), ["HomeNet", "Cafe Guest"]);
        assert!(parse_ssids("no wireless interface").is_empty());
    }

    #[test]
    fn profile_escapes_markup() {
        let xml = profile_xml("A&B <5G>", "p\"w'd");
        assert!(xml.contains("<name>A&amp;B &lt;5G&gt;</name>"));
        assert!(xml.contains("<keyMaterial>p&quot;w&apos;d</keyMaterial>"));
        assert!(xml.contains("<authentication>WPA2PSK</authentication>"));
    }

    #[test]
    fn profile_file_name_is_sanitized() {
        assert_eq!(profile_file_stem("../Home Net"), "___Home_Net");
        assert_eq!(profile_file_stem(""), "wifi-profile");
    }

    #[tokio::test]
    async fn list_networks_parses_scan_output() {
        let runner = FakeRunner::replying(vec![ok(SCAN)]);
        let wifi = WifiService::new(runner.clone(), std::env::temp_dir());
        assert_eq!(wifi.list_networks().await, ["HomeNet", "Cafe Guest"]);
        assert_eq!(runner.calls()[0], ["wlan", "show", "networks", "mode=bssid"]);
    }

    #[tokio::test]
    async fn list_networks_degrades_to_empty() {
        let runner = FakeRunner::replying(vec![failed()]);
        let wifi = WifiService::new(runner, std::env::temp_dir());
        assert!(wifi.list_networks().await.is_empty());

        let runner = FakeRunner::replying(vec![Err(io::Error::new(
            io::ErrorKind::NotFound,
            "netsh missing",
        ))]);
        let wifi = WifiService::new(runner, std::env::temp_dir());
        assert!(wifi.list_networks().await.is_empty());
    }

    #[tokio::test]
    async fn connect_adds_profile_then_connects() {
        let runner = FakeRunner::replying(vec![ok(""), ok("")]);
        let wifi = WifiService::new(runner.clone(), std::env::temp_dir());
        assert!(wifi.connect("HomeNet", "secret123").await);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][..3], ["wlan", "add", "profile"]);
        assert!(calls[0][3].ends_with("HomeNet.xml"));
        assert_eq!(calls[1], ["wlan", "connect", "name=HomeNet"]);

        let profiles = runner.profiles.lock().unwrap().clone();
        assert!(profiles[0].contains("<keyMaterial>secret123</keyMaterial>"));
        assert!(!wifi.profile_path("HomeNet").exists());
    }

    #[tokio::test]
    async fn connect_result_follows_connect_command_only() {
        let runner = FakeRunner::replying(vec![failed(), ok("")]);
        let wifi = WifiService::new(runner, std::env::temp_dir());
        assert!(wifi.connect("Office", "pw").await);

        let runner = FakeRunner::replying(vec![ok(""), failed()]);
        let wifi = WifiService::new(runner, std::env::temp_dir());
        assert!(!wifi.connect("Office", "pw").await);
    }
}
