use std::time::{Duration, Instant};

use claim_core::{ClaimAction, ClaimApp, ClaimPhase, ClaimState};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let usage = "usage: claim_probe <base_url> <claim_subject> <token> [--skip-airdrop]";
    let base_url = args.next().ok_or_else(|| anyhow::anyhow!(usage))?;
    let subject = args.next().ok_or_else(|| anyhow::anyhow!(usage))?;
    let token = args.next().ok_or_else(|| anyhow::anyhow!(usage))?;

    let mut skip_airdrop = false;
    for a in args {
        if a == "--skip-airdrop" {
            skip_airdrop = true;
            continue;
        }
        return Err(anyhow::anyhow!("unknown arg: {a}"));
    }

    let data_dir = std::env::temp_dir().join(format!("claim_probe_{}", std::process::id()));
    std::fs::create_dir_all(&data_dir)?;
    let config = serde_json::json!({ "api_base_url": base_url });
    std::fs::write(
        data_dir.join("claim_config.json"),
        serde_json::to_vec_pretty(&config)?,
    )?;

    let landing = format!("{base_url}/claim/{subject}/success?token={token}");
    // ClaimApp installs the tracing subscriber.
    let app = ClaimApp::new(data_dir.to_string_lossy().into_owned(), subject, landing);

    app.dispatch(ClaimAction::Start);
    let state = wait_for(&app, "identity exchange", Duration::from_secs(20), |s| {
        s.phase == ClaimPhase::IdentityReady
    })?;
    let profile = state
        .profile
        .ok_or_else(|| anyhow::anyhow!("identity ready without a profile"))?;
    eprintln!("profile: @{} ({})", profile.data.username, profile.data.name);

    app.dispatch(ClaimAction::ResolveAccount);
    let state = wait_for(&app, "account resolution", Duration::from_secs(20), |s| {
        s.phase == ClaimPhase::AccountReady
    })?;
    let address = state
        .account_address
        .ok_or_else(|| anyhow::anyhow!("account ready without an address"))?;
    eprintln!("smart account: {address}");

    if skip_airdrop {
        eprintln!("skipping airdrop dispatch");
    } else {
        app.dispatch(ClaimAction::SendAirdrop);
        wait_for(&app, "airdrop dispatch", Duration::from_secs(20), |s| {
            s.phase == ClaimPhase::Complete
        })?;
        eprintln!("airdrop dispatched");
    }

    app.dispatch(ClaimAction::Stop);
    Ok(())
}

fn wait_for(
    app: &ClaimApp,
    what: &str,
    timeout: Duration,
    f: impl Fn(&ClaimState) -> bool,
) -> anyhow::Result<ClaimState> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        let state = app.state();
        if let Some(err) = state.error.as_deref() {
            anyhow::bail!("{what}: flow error: {err}");
        }
        if f(&state) {
            return Ok(state);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    anyhow::bail!("{what}: not reached within {timeout:?}")
}
