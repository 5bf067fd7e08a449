use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use storefront_reviews::{
    Config, JsonFileStorage, NewReview, NotificationService, OrderLedger, Review, ReviewStore,
    VisibilityChange,
};

#[derive(Parser)]
#[command(name = "storefront-reviews")]
#[command(about = "Purchase-gated product reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, default_value = ".storefront/config.yml")]
    config: PathBuf,

    /// Override the review storage directory
    #[arg(long, env = "STOREFRONT_STORAGE")]
    storage_path: Option<PathBuf>,

    /// Override the order ledger file
    #[arg(long, env = "STOREFRONT_ORDERS")]
    orders_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a user may review a product
    CanReview {
        #[arg(long)]
        product: u64,

        #[arg(long)]
        user: String,
    },

    /// Submit a review
    Add {
        #[arg(long)]
        product: u64,

        #[arg(long)]
        user: String,

        /// Display name shown with the review
        #[arg(long)]
        name: String,

        #[arg(long)]
        rating: u8,

        #[arg(long, default_value = "")]
        comment: String,

        /// Order the purchase came from (looked up when omitted)
        #[arg(long)]
        order: Option<String>,
    },

    /// List visible reviews for a product
    List {
        #[arg(long)]
        product: u64,
    },

    /// List every review, hidden ones included
    All {
        /// Only reviews by this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Hide a review
    Hide { id: Uuid },

    /// Make a hidden review visible again
    Unhide { id: Uuid },

    /// Show rating summary for a product
    Summary {
        #[arg(long)]
        product: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("storefront_reviews=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let mut store = open_store(&cli, &config)?;

    match cli.command {
        Commands::CanReview { product, user } => {
            if store.can_user_review(product, &user) {
                println!("User {} can review product {}", user, product);
            } else {
                println!("User {} cannot review product {}", user, product);
            }
        }
        Commands::Add {
            product,
            user,
            name,
            rating,
            comment,
            order,
        } => {
            let order_id = order.or_else(|| {
                store
                    .orders()
                    .find_purchase(product, &user)
                    .map(|o| o.id.clone())
            });

            let review = store
                .add_review(NewReview {
                    product_id: product,
                    user_id: user,
                    user_name: name,
                    rating,
                    comment,
                    order_id,
                })
                .context("Review not accepted")?;

            println!("Added review {}", review.id);

            let notifier = NotificationService::new(&config.notifications.slack);
            if let Err(err) = notifier.notify_new_review(&review).await {
                warn!(error = ?err, "New review notification failed");
            }
        }
        Commands::List { product } => {
            let reviews = store.get_product_reviews(product);
            if reviews.is_empty() {
                println!("No reviews for product {}.", product);
            }
            for review in reviews {
                print_review(review);
            }
        }
        Commands::All { user } => {
            let reviews: Vec<&Review> = match user {
                Some(ref user) => store.user_reviews(user),
                None => store.all_reviews().iter().collect(),
            };
            if reviews.is_empty() {
                println!("No reviews.");
            }
            for review in reviews {
                print_review(review);
            }
        }
        Commands::Hide { id } => {
            set_visibility(&mut store, &config, &id, false).await;
        }
        Commands::Unhide { id } => {
            set_visibility(&mut store, &config, &id, true).await;
        }
        Commands::Summary { product } => {
            let summary = store.rating_summary(product);
            match summary.average {
                Some(average) => println!(
                    "Product {}: {:.1} average over {} reviews",
                    product, average, summary.count
                ),
                None => println!("Product {}: no reviews", product),
            }
            for (rating, count) in &summary.histogram {
                println!("  {} stars: {}", rating, count);
            }
        }
    }

    Ok(())
}

fn open_store(cli: &Cli, config: &Config) -> Result<ReviewStore<JsonFileStorage>> {
    let orders_path = cli.orders_path.as_ref().unwrap_or(&config.orders.path);
    let storage_path = cli.storage_path.as_ref().unwrap_or(&config.storage.path);

    let orders = OrderLedger::load(orders_path)?;
    let storage = JsonFileStorage::new(storage_path)?;

    Ok(ReviewStore::open(orders, storage).with_policy(config.reviews))
}

async fn set_visibility(
    store: &mut ReviewStore<JsonFileStorage>,
    config: &Config,
    id: &Uuid,
    is_visible: bool,
) {
    let state = if is_visible { "visible" } else { "hidden" };

    match store.toggle_review_visibility(id, is_visible) {
        VisibilityChange::NotFound => {
            println!("No review with ID {}", id);
            return;
        }
        VisibilityChange::Unchanged => {
            println!("Review {} is already {}", id, state);
            return;
        }
        VisibilityChange::Changed => println!("Review {} is now {}", id, state),
    }

    if is_visible {
        return;
    }

    if let Some(review) = store.find_review(id) {
        let notifier = NotificationService::new(&config.notifications.slack);
        if let Err(err) = notifier.notify_hidden(review).await {
            warn!(error = ?err, "Hidden review notification failed");
        }
    }
}

fn print_review(review: &Review) {
    let visibility = if review.is_visible { "" } else { " [hidden]" };
    println!(
        "{} rated {} by {} ({}){}",
        review.date.format("%Y-%m-%d"),
        review.rating,
        review.user_name,
        review.user_id,
        visibility
    );
    if !review.comment.is_empty() {
        println!("    {}", review.comment);
    }
    println!("    ID: {}", review.id);
    if let Some(ref order_id) = review.order_id {
        println!("    Order: {}", order_id);
    }
    println!();
}
