use std::sync::Arc;

use civic_pulse_client::crypto::hashing::derive_citizen_id;
use civic_pulse_client::domain::contract::{calls, ContractClient};
use civic_pulse_client::domain::provider::WalletProvider;
use civic_pulse_client::domain::types::{format_address, format_hash, short_address};
use civic_pulse_client::infra::rpc;
use civic_pulse_client::{ClientConfig, ContractResolver, ProviderBinding};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads env vars (all optional):\n\
           CIVIC_WALLET_RPC_URL, CIVIC_LEGACY_RPC_URL, CIVIC_LOCAL_RPC_URL,\n\
           CIVIC_MANIFEST_PATH, CIVIC_RECEIPT_POLL_MS, CIVIC_RECEIPT_POLL_ATTEMPTS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = ClientConfig::from_env()?;
    println!("> Preflight:");
    println!("  CIVIC_WALLET_RPC_URL={}", config.wallet_rpc_url.as_deref().unwrap_or("<unset>"));
    println!("  CIVIC_LEGACY_RPC_URL={}", config.legacy_rpc_url.as_deref().unwrap_or("<unset>"));
    println!("  CIVIC_LOCAL_RPC_URL={}", config.local_rpc_url);
    println!("  CIVIC_MANIFEST_PATH={}", config.manifest_path.display());

    // Endpoint reachability, in binding order
    let providers = rpc::wallet_candidates(&config);
    for p in &providers {
        match p.network_id().await {
            Ok(network) => println!("  {:?} {} -> network {}", p.kind(), p.url(), network),
            Err(e) => eprintln!("  Warning: {:?} {} unreachable: {}", p.kind(), p.url(), e),
        }
    }

    let candidates: Vec<Arc<dyn WalletProvider>> = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn WalletProvider>)
        .collect();
    let mut binding = ProviderBinding::new(candidates);
    let account = binding
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("No usable wallet provider: {}", e))?;
    let network = binding
        .current_network()
        .ok_or_else(|| anyhow::anyhow!("Bound provider reported no network"))?;
    println!("  Bound {:?} provider, account {}", binding.active_kind(), short_address(&account));

    // Contract resolution
    let resolver = ContractResolver::from_path(config.manifest_path.clone());
    let handle = resolver.resolve(network).await;
    println!("  Contract on network {}: {}", network, format_address(&handle.address));
    match handle.degraded_reason() {
        Some(reason) => eprintln!("  Warning: degraded interface (registration only): {}", reason),
        None => println!("  Interface declares: {}", handle.abi().function_names().join(", ")),
    }
    for method in [calls::VOTE, calls::CREATE_PROPOSAL, calls::REPORT_ISSUE] {
        if !handle.supports(method) {
            eprintln!("  Warning: '{}' is not available on this interface", method);
        }
    }

    // Read-only registration lookup for the bound account
    let citizen = derive_citizen_id(&account);
    println!("  Citizen id: {}", format_hash(&citizen));
    let contract = binding
        .contract_client()
        .ok_or_else(|| anyhow::anyhow!("Bound provider has no contract client"))?;
    match contract.registered_citizens(&handle, citizen).await {
        Ok(true) => println!("  Citizen is registered."),
        Ok(false) => println!("  Citizen is not registered yet (connect will offer registration)."),
        Err(e) => eprintln!("  Warning: registeredCitizens call failed: {}", e),
    }

    println!("> Preflight OK.");
    Ok(())
}
