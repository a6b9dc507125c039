// Demo run of the storefront core: seed the catalog, fill a cart, connect
// a simulated wallet and walk the full checkout once.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bloomstore::catalog::seed;
use bloomstore::utils::{format_eth, format_inr, short_address};
use bloomstore::wallet::SimulatedAgent;
use bloomstore::{CartStore, CatalogStore, Checkout, Config, PaymentGateway, WalletSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloomstore=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Storefront configured for {} (chain {}), contract {}",
        config.chain.chain_name,
        config.chain.chain_id,
        short_address(&config.contract.address)
    );

    // Seed the catalog and build the stores
    let catalog = CatalogStore::new(seed::load()?);
    let cart = CartStore::new();
    info!("Catalog seeded with {} flowers", catalog.len().await);

    // A simulated wallet that starts on mainnet, so connecting also
    // exercises the network switch.
    let buyer: ethers::types::Address =
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse()?;
    let agent = Arc::new(SimulatedAgent::new(buyer));
    agent.set_chain(1);
    agent.set_contract_owner(config.contract.owner);

    let session = Arc::new(WalletSession::new(agent.clone(), config.chain.clone()));
    session.watch().await;
    let gateway = Arc::new(PaymentGateway::new(config.contract.clone()));
    let checkout = Checkout::new(
        session.clone(),
        gateway.clone(),
        cart.clone(),
        catalog.clone(),
    );

    // Put the two cheapest flowers in the cart
    let mut flowers = catalog.available().await;
    flowers.sort_by_key(|f| f.price);
    for flower in flowers.iter().take(2) {
        info!("Adding {} ({})", flower.title, format_inr(flower.price));
        cart.add(flower).await;
    }
    info!(
        "Cart: {} item(s), {} total, {} to pay",
        cart.count().await,
        format_inr(cart.total().await),
        format_eth(gateway.total_for(cart.line_count().await))
    );

    // Probe for an already-authorized account first, then prompt
    let address = match session.restore().await {
        Some(address) => address,
        None => session.connect().await?,
    };
    info!("Paying from {}", short_address(&address));
    let receipt = checkout.place_order().await?;

    info!(
        "Order {} confirmed: tx {:#x} in block {}, paid {}",
        receipt.order_id,
        receipt.tx_hash,
        receipt.block_number,
        format_eth(receipt.paid_wei)
    );
    info!(
        "Catalog now has {} flowers, cart is empty: {}",
        catalog.len().await,
        cart.is_empty().await
    );

    let contract_info = gateway.contract_info(agent.as_ref()).await?;
    info!(
        "Contract owner {}, {} payment(s) received",
        short_address(&contract_info.owner),
        contract_info.total_payments
    );

    session.close().await;
    Ok(())
}
