// ============================================================================
// catalog - terminal front end for the product catalog
// ============================================================================
// Usage:
//   catalog list [--pages N | --all] [--query QS]   List (filtered) products
//   catalog filter --category beauty --min-price 5  Change the active filter
//   catalog categories                              Categories of loaded products
//   catalog show 12                                 Product detail
//   catalog edit 12 --price 9.99                    Local edit (authenticated)
//   catalog login | logout | status                 Authenticated-mode flag
// ============================================================================

use anyhow::{bail, Result};
use catalog_core::catalog::{CatalogLoader, CatalogSnapshot, HttpCatalogSource, LoadOutcome};
use catalog_core::edit::{EditForm, EditOverlay};
use catalog_core::filter::{FilterState, MinRating, QueryParams};
use catalog_core::view::{load_detail, ListingController, ListingView, ProductDetail, QueryLocation};
use catalog_core::{CatalogConfig, LocalStore, Product};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::warn;

/// Product catalog browser
#[derive(Parser)]
#[command(name = "catalog", version, about = "Browse, filter and locally edit the product catalog")]
struct Cli {
    /// Catalog API base URL (default: CATALOG_API_BASE or https://dummyjson.com)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Path to the local store (default: CATALOG_DB_PATH or ~/.catalog/catalog.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct PageArgs {
    /// Number of pages to load
    #[arg(long, default_value = "1")]
    pages: usize,

    /// Load every page
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List products with the active filter applied
    List {
        #[command(flatten)]
        paging: PageArgs,

        /// Replace the active filter with this query string (e.g. "categories=beauty&minPrice=5")
        #[arg(long)]
        query: Option<String>,
    },

    /// Set the active filter (replaces the previous one entirely)
    Filter {
        #[arg(long)]
        search: Option<String>,

        /// Category to include; repeat for several
        #[arg(long = "category")]
        categories: Vec<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        /// Minimum rating: 1, 2, 3 or 4
        #[arg(long)]
        rating: Option<String>,

        #[arg(long)]
        discounted_only: bool,

        /// Minimum discount percent (with --discounted-only)
        #[arg(long)]
        min_discount: Option<f64>,

        /// Clear every filter
        #[arg(long, conflicts_with_all = ["search", "categories", "min_price", "max_price", "rating", "discounted_only", "min_discount"])]
        reset: bool,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show the categories present in the loaded products
    Categories {
        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show one product
    Show { id: u64 },

    /// Edit a product locally (authenticated mode only; not saved to the server)
    Edit {
        id: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        rating: Option<f64>,

        #[arg(long)]
        discount: Option<f64>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Switch to authenticated mode
    Login,

    /// Switch to unauthenticated mode
    Logout,

    /// Show mode, active filter and store location
    Status,
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog_core=info".parse()?)
                .add_directive("catalog=info".parse()?),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal
        if !e.not_found() {
            eprintln!("Warning: Could not load .env file: {}", e);
        }
    }
    init_logging()?;

    let cli = Cli::parse();
    let mut config = CatalogConfig::from_env();
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if let Some(db_path) = cli.db_path {
        config.db_path = Some(db_path.into());
    }

    let store = LocalStore::open(config.resolve_db_path()?, config.auth_key.clone())?;
    let app = App {
        source: Arc::new(HttpCatalogSource::new(config.api_base.clone())),
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::List { paging, query } => app.cmd_list(store, paging, query).await,
        Commands::Filter {
            search,
            categories,
            min_price,
            max_price,
            rating,
            discounted_only,
            min_discount,
            reset,
            paging,
        } => {
            let filter = if reset {
                FilterState::default()
            } else {
                FilterState {
                    search,
                    categories: categories.into_iter().collect(),
                    min_price,
                    max_price,
                    rating: rating.map(MinRating::new),
                    discounted_only,
                    min_discount_percent: min_discount,
                }
            };
            app.cmd_filter(store, filter, paging).await
        }
        Commands::Categories { paging } => app.cmd_categories(store, paging).await,
        Commands::Show { id } => app.cmd_show(id).await,
        Commands::Edit {
            id,
            title,
            price,
            rating,
            discount,
            description,
        } => {
            app.cmd_edit(&store, id, EditArgs { title, price, rating, discount, description })
                .await
        }
        Commands::Login => cmd_login(&store),
        Commands::Logout => cmd_logout(&store),
        Commands::Status => cmd_status(&store),
    }
}

struct EditArgs {
    title: Option<String>,
    price: Option<f64>,
    rating: Option<f64>,
    discount: Option<f64>,
    description: Option<String>,
}

struct App {
    source: Arc<HttpCatalogSource>,
    config: CatalogConfig,
    json: bool,
}

impl App {
    fn loader(&self) -> CatalogLoader {
        CatalogLoader::with_page_size(self.source.clone(), self.config.page_size)
    }

    async fn load(&self, paging: PageArgs) -> Result<CatalogSnapshot> {
        let loader = self.loader();
        loader.load_initial().await;

        if paging.all {
            loader.load_all().await;
        } else {
            for _ in 1..paging.pages {
                if !matches!(loader.load_more().await, LoadOutcome::Loaded(_)) {
                    break;
                }
            }
        }

        let snapshot = loader.snapshot().await;
        if let Some(err) = &snapshot.error {
            if snapshot.products.is_empty() {
                bail!("Error loading products: {}", err);
            }
            warn!("Stopped loading early: {}", err);
        }
        Ok(snapshot)
    }

    async fn cmd_list(&self, store: LocalStore, paging: PageArgs, query: Option<String>) -> Result<()> {
        let mut controller = ListingController::new(store)?;
        if let Some(query) = query {
            // Same as navigating to a pasted link
            controller.location().write_query(&QueryParams::parse(&query))?;
            controller.sync_from_location()?;
        }

        let snapshot = self.load(paging).await?;
        self.render_listing(&controller.view(&snapshot), controller.query())
    }

    async fn cmd_filter(&self, store: LocalStore, filter: FilterState, paging: PageArgs) -> Result<()> {
        filter.validate()?;

        let mut controller = ListingController::new(store)?;
        controller.submit_filter(filter)?;

        let snapshot = self.load(paging).await?;
        self.render_listing(&controller.view(&snapshot), controller.query())
    }

    async fn cmd_categories(&self, store: LocalStore, paging: PageArgs) -> Result<()> {
        let controller = ListingController::new(store)?;
        let snapshot = self.load(paging).await?;
        let view = controller.view(&snapshot);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&view.categories)?);
            return Ok(());
        }

        for category in &view.categories {
            let selected = controller.filter().categories.contains(category);
            println!("[{}] {}", if selected { "x" } else { " " }, category);
        }
        println!(
            "\n{} categories in {} of {} products",
            view.categories.len(),
            view.count.loaded,
            view.count.total
        );
        Ok(())
    }

    async fn cmd_show(&self, id: u64) -> Result<()> {
        // Edits live only for the lifetime of the overlay
        let overlay = EditOverlay::in_memory();
        let detail = load_detail(self.source.as_ref(), &overlay, id).await?;
        self.render_detail(&detail)
    }

    async fn cmd_edit(&self, store: &LocalStore, id: u64, args: EditArgs) -> Result<()> {
        if !store.is_authenticated()? {
            bail!("Editing requires authenticated mode. Run `catalog login` first.");
        }

        let overlay = EditOverlay::in_memory();
        let edits = overlay.for_product(id);
        let detail = load_detail(self.source.as_ref(), &overlay, id).await?;

        let current = EditForm::from_product(&detail.product);
        let form = EditForm {
            title: args.title.unwrap_or(current.title),
            price: args.price.unwrap_or(current.price),
            rating: args.rating.or(current.rating),
            discount_percentage: args.discount.or(current.discount_percentage),
            description: args.description.or(current.description),
        };
        edits.save_edit(form.into_patch()?);

        let detail = ProductDetail::new(&detail.product, &overlay);
        self.render_detail(&detail)?;
        if !self.json {
            println!("\n(edit applied locally for this session; nothing was sent to the server)");
        }
        Ok(())
    }

    fn render_listing(&self, view: &ListingView, query: &QueryParams) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(view)?);
            return Ok(());
        }

        if !query.is_empty() {
            println!("Filter: ?{}\n", query.to_query_string());
        }

        if view.products.is_empty() {
            println!("No products match the current filter.");
        } else {
            println!(
                "{:<6}  {:<36}  {:<20}  {:>10}  {:>6}  {:>8}",
                "ID", "TITLE", "CATEGORY", "PRICE", "RATING", "DISCOUNT"
            );
            println!("{}", "-".repeat(96));
            for product in &view.products {
                print_row(product);
            }
        }

        println!("\n{}", view.count);
        if view.has_more {
            println!(
                "{} of {} loaded; use --pages N or --all to load more",
                view.count.loaded, view.count.total
            );
        }
        Ok(())
    }

    fn render_detail(&self, detail: &ProductDetail) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(detail)?);
            return Ok(());
        }

        let product = &detail.product;
        println!("#{} {}{}", product.id, product.title, if detail.edited { " (edited)" } else { "" });
        println!("Category: {}", product.category);
        if let Some(brand) = &product.brand {
            println!("Brand:    {}", brand);
        }
        println!("Price:    ${:.2}", product.price);
        if let Some(rating) = product.rating {
            println!("Rating:   {:.1} / 5", rating);
        }
        if let Some(discount) = product.discount_percentage.filter(|d| *d > 0.0) {
            println!("Discount: {:.0}% OFF", discount);
        }
        if let Some(stock) = product.stock {
            println!("Stock:    {}", stock);
        }
        if let Some(tags) = product.tags.as_ref().filter(|t| !t.is_empty()) {
            println!("Tags:     {}", tags.join(", "));
        }
        if let Some(description) = &product.description {
            println!("\n{}", description);
        }
        if !detail.gallery.is_empty() {
            println!("\nImages ({}):", detail.gallery.len());
            for (index, image) in detail.gallery.iter().enumerate() {
                println!("  {}. {}", index + 1, image);
            }
        }
        Ok(())
    }
}

fn print_row(product: &Product) {
    let title = product.title.chars().take(36).collect::<String>();
    let rating = product
        .rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "-".into());
    let discount = product
        .discount_percentage
        .filter(|d| *d > 0.0)
        .map(|d| format!("{:.0}%", d))
        .unwrap_or_else(|| "-".into());
    println!(
        "{:<6}  {:<36}  {:<20}  {:>10}  {:>6}  {:>8}",
        product.id,
        title,
        product.category,
        format!("${:.2}", product.price),
        rating,
        discount
    );
}

fn cmd_login(store: &LocalStore) -> Result<()> {
    store.login()?;
    println!("Logged in (flag '{}' set).", store.auth_key());
    Ok(())
}

fn cmd_logout(store: &LocalStore) -> Result<()> {
    if store.logout()? {
        println!("Logged out.");
    } else {
        println!("Already logged out.");
    }
    Ok(())
}

fn cmd_status(store: &LocalStore) -> Result<()> {
    let query = store.load_query()?;
    println!("=== Catalog Status ===");
    println!("Store:  {}", store.path().display());
    println!(
        "Mode:   {}",
        if store.is_authenticated()? { "authenticated" } else { "guest" }
    );
    if query.is_empty() {
        println!("Filter: (none)");
    } else {
        println!("Filter: ?{}", query.to_query_string());
    }
    Ok(())
}
