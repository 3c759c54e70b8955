use chrono::{Local, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use innoventory::config::{
    data_dir as default_data_dir, ensure_initialized, global_config_file, init_data_dir,
    load_config, load_global_config, Config,
};
use innoventory::dashboard::{recent_orders, summarize};
use innoventory::error::{InnoventoryError, Result};
use innoventory::export::{default_export_path, export_view, ExportFormat};
use innoventory::store::{
    Attachable, AuditAction, Client, ClientPatch, Entity, EntityKind, NewClient, NewOrder,
    NewSubAdmin, NewVendor, NewWorkType, Order, OrderPatch, OrderStatus, Permission, RecordStatus,
    Store, SubAdmin, SubAdminPatch, Vendor, VendorPatch, VendorType, WorkType, WorkTypePatch,
};
use innoventory::table::{apply, Filter, Page, Record, Sort, TableQuery, TableView};
use innoventory::upload;

#[derive(Parser)]
#[command(name = "innoventory")]
#[command(
    version,
    about = "Records dashboard for vendors, clients and work orders",
    long_about = None
)]
struct Cli {
    /// Path to data directory (default: XDG data dir or ~/.innoventory)
    #[arg(short = 'C', long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory with a template config
    Init,

    /// Show data directory, record counts and next order number
    Status,

    /// Manage vendors
    Vendor {
        #[command(subcommand)]
        action: VendorCommand,
    },

    /// Manage clients
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },

    /// Manage work orders
    Order {
        #[command(subcommand)]
        action: OrderCommand,
    },

    /// Manage sub-admins
    SubAdmin {
        #[command(subcommand)]
        action: SubAdminCommand,
    },

    /// Manage the type-of-work lookup list
    WorkType {
        #[command(subcommand)]
        action: WorkTypeCommand,
    },

    /// Show headline numbers and recent orders
    Dashboard,

    /// Show the change log, newest first
    Audit {
        /// Only entries for this entity
        #[arg(long, value_enum)]
        entity: Option<EntityKind>,

        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Export a table to CSV, JSON or PDF
    Export {
        /// Which table to export
        #[arg(value_enum)]
        entity: EntityKind,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        #[command(flatten)]
        table: TableArgs,

        /// Custom output file path (default: export dir + filename format)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the exported file with the system default viewer
        #[arg(long)]
        open: bool,
    },
}

/// Filter, sort, paginate and column options shared by list and export
#[derive(Args, Debug, Default, Clone)]
struct TableArgs {
    /// Case-insensitive search across the shown columns
    #[arg(short, long)]
    search: Option<String>,

    /// Column filter, case-insensitive substring (can be repeated)
    #[arg(short, long = "filter", value_name = "COLUMN=VALUE")]
    filter: Vec<String>,

    /// Column to sort by; naming the same column again flips the direction
    #[arg(long, value_name = "COLUMN")]
    sort: Vec<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Page number, starting at 1
    #[arg(long)]
    page: Option<usize>,

    /// Rows per page (default from config)
    #[arg(long)]
    page_size: Option<usize>,

    /// Columns to show, comma separated (e.g., id,company,email)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Include soft-deleted records
    #[arg(long)]
    include_deleted: bool,
}

impl TableArgs {
    fn to_query(&self, default_page_size: usize, paginate: bool) -> Result<TableQuery> {
        let filters = self
            .filter
            .iter()
            .map(|f| Filter::parse(f))
            .collect::<Result<Vec<_>>>()?;
        let mut sort: Option<Sort> = None;
        for column in &self.sort {
            sort = Some(Sort::toggled(sort.as_ref(), column));
        }
        if self.desc {
            sort = sort.map(|s| Sort::desc(s.column));
        }
        let page = if paginate || self.page.is_some() || self.page_size.is_some() {
            Some(Page {
                number: self.page.unwrap_or(1),
                size: self.page_size.unwrap_or(default_page_size),
            })
        } else {
            None
        };
        Ok(TableQuery {
            search: self.search.clone(),
            filters,
            sort,
            page,
            columns: (!self.columns.is_empty()).then(|| self.columns.clone()),
        })
    }
}

#[derive(Args)]
struct DeleteArgs {
    /// Remove permanently instead of soft-deleting
    #[arg(long)]
    hard: bool,
}

#[derive(Subcommand)]
enum VendorCommand {
    /// Add a vendor
    Add(VendorAddArgs),
    /// List vendors
    List(TableArgs),
    /// Show one vendor
    Show { id: u32 },
    /// Change vendor fields (pass "" to clear an optional field)
    Edit {
        id: u32,
        #[command(flatten)]
        fields: VendorEditArgs,
    },
    /// Delete a vendor (soft unless --hard)
    Delete {
        id: u32,
        #[command(flatten)]
        delete: DeleteArgs,
    },
    /// Undo a soft delete
    Restore { id: u32 },
    /// Upload files to a vendor
    Attach {
        id: u32,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an uploaded file from a vendor
    Detach { id: u32, name: String },
}

#[derive(Args)]
struct VendorAddArgs {
    /// Company or individual name
    #[arg(long)]
    company: String,
    #[arg(long = "type", value_enum, default_value_t = VendorType::Firm)]
    vendor_type: VendorType,
    #[arg(long)]
    email: String,
    /// Phone number (can be repeated)
    #[arg(long = "phone")]
    phones: Vec<String>,
    #[arg(long, default_value = "India")]
    country: String,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// GST registration number
    #[arg(long)]
    gst: Option<String>,
    /// Type of work handled (can be repeated)
    #[arg(long = "work")]
    work_types: Vec<String>,
}

#[derive(Args)]
struct VendorEditArgs {
    #[arg(long)]
    company: Option<String>,
    #[arg(long = "type", value_enum)]
    vendor_type: Option<VendorType>,
    #[arg(long)]
    email: Option<String>,
    /// Replaces all phone numbers (can be repeated)
    #[arg(long = "phone")]
    phones: Vec<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    gst: Option<String>,
    /// Replaces all types of work (can be repeated)
    #[arg(long = "work")]
    work_types: Vec<String>,
    #[arg(long, value_enum)]
    status: Option<RecordStatus>,
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Add a client
    Add(ClientAddArgs),
    /// List clients
    List(TableArgs),
    /// Show one client
    Show { id: u32 },
    /// Change client fields (pass "" to clear an optional field)
    Edit {
        id: u32,
        #[command(flatten)]
        fields: ClientEditArgs,
    },
    /// Delete a client (soft unless --hard)
    Delete {
        id: u32,
        #[command(flatten)]
        delete: DeleteArgs,
    },
    /// Undo a soft delete
    Restore { id: u32 },
    /// Upload files to a client
    Attach {
        id: u32,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an uploaded file from a client
    Detach { id: u32, name: String },
}

#[derive(Args)]
struct ClientAddArgs {
    #[arg(long)]
    company: String,
    /// Contact person
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    email: String,
    /// Phone number (can be repeated)
    #[arg(long = "phone")]
    phones: Vec<String>,
    #[arg(long, default_value = "India")]
    country: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    website: Option<String>,
}

#[derive(Args)]
struct ClientEditArgs {
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Replaces all phone numbers (can be repeated)
    #[arg(long = "phone")]
    phones: Vec<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long, value_enum)]
    status: Option<RecordStatus>,
}

#[derive(Subcommand)]
enum OrderCommand {
    /// Create a work order
    Add(OrderAddArgs),
    /// List orders
    List(TableArgs),
    /// Show one order (id or number, e.g., 3 or ORD-2026-0003)
    Show { order: String },
    /// Change order fields
    Edit {
        order: String,
        #[command(flatten)]
        fields: OrderEditArgs,
    },
    /// Delete an order (soft unless --hard)
    Delete {
        order: String,
        #[command(flatten)]
        delete: DeleteArgs,
    },
    /// Undo a soft delete
    Restore { order: String },
    /// Upload files to an order
    Attach {
        order: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an uploaded file from an order
    Detach { order: String, name: String },
}

#[derive(Args)]
struct OrderAddArgs {
    /// Client id
    #[arg(long)]
    client: u32,
    /// Vendor id
    #[arg(long)]
    vendor: Option<u32>,
    /// Type of work
    #[arg(long)]
    work: String,
    #[arg(long)]
    description: Option<String>,
    /// Order date, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Due date, YYYY-MM-DD
    #[arg(long)]
    due: Option<NaiveDate>,
    /// Amount billed to the client
    #[arg(long)]
    client_amount: f64,
    /// Amount paid to the vendor
    #[arg(long, default_value_t = 0.0)]
    vendor_amount: f64,
}

#[derive(Args)]
struct OrderEditArgs {
    #[arg(long)]
    client: Option<u32>,
    #[arg(long, conflicts_with = "no_vendor")]
    vendor: Option<u32>,
    /// Unassign the vendor
    #[arg(long)]
    no_vendor: bool,
    #[arg(long)]
    work: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, conflicts_with = "no_due")]
    due: Option<NaiveDate>,
    /// Clear the due date
    #[arg(long)]
    no_due: bool,
    #[arg(long)]
    client_amount: Option<f64>,
    #[arg(long)]
    vendor_amount: Option<f64>,
    #[arg(long, value_enum)]
    status: Option<OrderStatus>,
}

#[derive(Subcommand)]
enum SubAdminCommand {
    /// Add a sub-admin
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        /// Page the sub-admin may manage (can be repeated)
        #[arg(long = "permission", value_enum)]
        permissions: Vec<Permission>,
    },
    /// List sub-admins
    List(TableArgs),
    /// Show one sub-admin
    Show { id: u32 },
    /// Change sub-admin fields
    Edit {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Replaces all permissions (can be repeated)
        #[arg(long = "permission", value_enum)]
        permissions: Vec<Permission>,
        #[arg(long, value_enum)]
        status: Option<RecordStatus>,
    },
    /// Delete a sub-admin (soft unless --hard)
    Delete {
        id: u32,
        #[command(flatten)]
        delete: DeleteArgs,
    },
    /// Undo a soft delete
    Restore { id: u32 },
}

#[derive(Subcommand)]
enum WorkTypeCommand {
    /// Add a type of work
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List types of work
    List(TableArgs),
    /// Rename, describe, or (de)activate a type of work
    Edit {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a type of work (soft unless --hard)
    Delete {
        id: u32,
        #[command(flatten)]
        delete: DeleteArgs,
    },
    /// Undo a soft delete
    Restore { id: u32 },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("innoventory={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir {
        Some(p) => p,
        None => default_data_dir()?,
    };
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        Commands::Init => cmd_init(&data_dir),
        Commands::Status => cmd_status(&data_dir),
        Commands::Vendor { action } => run_vendor(&data_dir, action),
        Commands::Client { action } => run_client(&data_dir, action),
        Commands::Order { action } => run_order(&data_dir, action),
        Commands::SubAdmin { action } => run_sub_admin(&data_dir, action),
        Commands::WorkType { action } => run_work_type(&data_dir, action),
        Commands::Dashboard => cmd_dashboard(&data_dir),
        Commands::Audit { entity, limit } => cmd_audit(&data_dir, entity, limit),
        Commands::Export {
            entity,
            format,
            table,
            output,
            open,
        } => cmd_export(&data_dir, entity, format, &table, output, open),
    }
}

/// Load config and store for a command
fn open_data(data_dir: &Path) -> Result<(Config, Store)> {
    ensure_initialized(data_dir)?;
    let config = load_config(data_dir)?;
    let store = Store::load(data_dir)?;
    Ok((config, store))
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Initialize data directory with template files
fn cmd_init(data_dir: &Path) -> Result<()> {
    init_data_dir(data_dir)?;

    println!("Initialized innoventory data at: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Review settings:        $EDITOR {}/config.toml",
        data_dir.display()
    );
    println!("  2. Add types of work:      innoventory work-type add --name <name>");
    println!("  3. Add clients and vendors, then create orders:");
    println!("     innoventory order add --client <id> --work <name> --client-amount <amount>");

    Ok(())
}

fn cmd_status(data_dir: &Path) -> Result<()> {
    let (config, store) = open_data(data_dir)?;
    let today = Local::now().date_naive();

    println!("Innoventory Status");
    println!("{}", "-".repeat(50));

    let global_path = global_config_file();
    if load_global_config().data_dir.is_some() {
        println!("Global config:    {} (active)", global_path.display());
    }
    println!("Data directory:   {}", data_dir.display());
    println!("Company:          {}", config.company.name);
    println!("Vendors:          {}", store.listing::<Vendor>(false).len());
    println!("Clients:          {}", store.listing::<Client>(false).len());
    println!("Orders:           {}", store.listing::<Order>(false).len());
    println!("Sub-admins:       {}", store.listing::<SubAdmin>(false).len());
    println!("Types of work:    {}", store.listing::<WorkType>(false).len());
    println!(
        "Next order:       {}",
        store.peek_order_number(&config.orders.number_format, today)
    );

    Ok(())
}

/// Print a list page for any record type
fn print_table<R: Record>(
    rows: &[R],
    args: &TableArgs,
    config: &Config,
    kind: EntityKind,
) -> Result<()> {
    let query = args.to_query(config.table.page_size, true)?;
    let view = apply(rows, &query)?;
    if view.total == 0 {
        println!("No {} found.", kind.plural().replace('-', " "));
        return Ok(());
    }
    if view.is_empty() {
        println!("{}", view.summary());
        return Ok(());
    }
    println!("{}", view.render());
    println!("{}", view.summary());
    Ok(())
}

/// Print every column of one record as label/value pairs
fn print_details<R: Record>(title: &str, record: &R, files: &[String]) {
    let mut builder = Builder::default();
    for column in R::columns() {
        if column.key == "files" {
            continue;
        }
        builder.push_record([column.header.to_string(), record.cell(column.key).display()]);
    }
    let files = if files.is_empty() {
        "-".to_string()
    } else {
        files.join("\n")
    };
    builder.push_record(["FILES".to_string(), files]);

    println!("{title}");
    println!("{}", builder.build().with(Style::rounded()));
}

fn cmd_list<E: Entity>(data_dir: &Path, args: &TableArgs) -> Result<()> {
    let (config, store) = open_data(data_dir)?;
    let records = store.listing::<E>(args.include_deleted);
    print_table(&records, args, &config, E::KIND)
}

fn cmd_delete<E: Entity>(data_dir: &Path, id: u32, hard: bool) -> Result<()> {
    let (_, mut store) = open_data(data_dir)?;
    if hard {
        let removed = store.hard_delete::<E>(id)?;
        store.save(data_dir)?;
        upload::remove_all(data_dir, E::KIND, id)?;
        println!("Permanently deleted {} #{id} ({})", E::KIND, removed.label());
    } else {
        store.soft_delete::<E>(id)?;
        store.save(data_dir)?;
        println!(
            "Deleted {} #{id}. Undo with 'innoventory {} restore {id}'",
            E::KIND,
            E::KIND
        );
    }
    Ok(())
}

fn cmd_restore<E: Entity>(data_dir: &Path, id: u32) -> Result<()> {
    let (_, mut store) = open_data(data_dir)?;
    store.restore::<E>(id)?;
    store.save(data_dir)?;
    println!("Restored {} #{id}", E::KIND);
    Ok(())
}

fn cmd_attach<E: Attachable>(data_dir: &Path, id: u32, files: &[PathBuf]) -> Result<()> {
    let (config, mut store) = open_data(data_dir)?;
    store.get_live::<E>(id)?;

    // Validate everything before copying anything
    for file in files {
        upload::validate_upload(file, &config.uploads)?;
    }

    // Earlier files stay recorded if a later copy fails
    for file in files {
        let stored = upload::store_upload(data_dir, E::KIND, id, file, &config.uploads)?;
        store.attach::<E>(id, &stored)?;
        store.save(data_dir)?;
        println!("Attached {} to {} #{id} as '{stored}'", file.display(), E::KIND);
    }
    Ok(())
}

fn cmd_detach<E: Attachable>(data_dir: &Path, id: u32, name: &str) -> Result<()> {
    let (_, mut store) = open_data(data_dir)?;
    store.detach::<E>(id, name)?;
    store.save(data_dir)?;
    upload::remove_upload(data_dir, E::KIND, id, name)?;
    println!("Removed '{name}' from {} #{id}", E::KIND);
    Ok(())
}

fn run_vendor(data_dir: &Path, action: VendorCommand) -> Result<()> {
    match action {
        VendorCommand::Add(args) => {
            let (_, mut store) = open_data(data_dir)?;
            let id = store.add_vendor(NewVendor {
                company_name: args.company,
                vendor_type: args.vendor_type,
                email: args.email,
                phones: args.phones,
                country: args.country,
                state: args.state,
                city: args.city,
                address: args.address,
                gst_number: args.gst,
                work_types: args.work_types,
            })?;
            store.save(data_dir)?;
            let vendor = store.get::<Vendor>(id)?;
            println!("Added vendor #{id} ({})", vendor.company_name);
            Ok(())
        }
        VendorCommand::List(args) => cmd_list::<Vendor>(data_dir, &args),
        VendorCommand::Show { id } => {
            let (_, store) = open_data(data_dir)?;
            let vendor = store.get::<Vendor>(id)?;
            print_details(&format!("Vendor #{id}"), vendor, vendor.files());
            Ok(())
        }
        VendorCommand::Edit { id, fields } => {
            let (_, mut store) = open_data(data_dir)?;
            store.update_vendor(
                id,
                VendorPatch {
                    company_name: fields.company,
                    vendor_type: fields.vendor_type,
                    email: fields.email,
                    phones: non_empty(fields.phones),
                    country: fields.country,
                    state: fields.state,
                    city: fields.city,
                    address: fields.address,
                    gst_number: fields.gst,
                    work_types: non_empty(fields.work_types),
                    status: fields.status,
                },
            )?;
            store.save(data_dir)?;
            println!("Updated vendor #{id}");
            Ok(())
        }
        VendorCommand::Delete { id, delete } => cmd_delete::<Vendor>(data_dir, id, delete.hard),
        VendorCommand::Restore { id } => cmd_restore::<Vendor>(data_dir, id),
        VendorCommand::Attach { id, files } => cmd_attach::<Vendor>(data_dir, id, &files),
        VendorCommand::Detach { id, name } => cmd_detach::<Vendor>(data_dir, id, &name),
    }
}

fn run_client(data_dir: &Path, action: ClientCommand) -> Result<()> {
    match action {
        ClientCommand::Add(args) => {
            let (_, mut store) = open_data(data_dir)?;
            let id = store.add_client(NewClient {
                company_name: args.company,
                contact_name: args.contact,
                email: args.email,
                phones: args.phones,
                country: args.country,
                city: args.city,
                address: args.address,
                website: args.website,
            })?;
            store.save(data_dir)?;
            let client = store.get::<Client>(id)?;
            println!("Added client #{id} ({})", client.company_name);
            Ok(())
        }
        ClientCommand::List(args) => cmd_list::<Client>(data_dir, &args),
        ClientCommand::Show { id } => {
            let (_, store) = open_data(data_dir)?;
            let client = store.get::<Client>(id)?;
            print_details(&format!("Client #{id}"), client, client.files());
            Ok(())
        }
        ClientCommand::Edit { id, fields } => {
            let (_, mut store) = open_data(data_dir)?;
            store.update_client(
                id,
                ClientPatch {
                    company_name: fields.company,
                    contact_name: fields.contact,
                    email: fields.email,
                    phones: non_empty(fields.phones),
                    country: fields.country,
                    city: fields.city,
                    address: fields.address,
                    website: fields.website,
                    status: fields.status,
                },
            )?;
            store.save(data_dir)?;
            println!("Updated client #{id}");
            Ok(())
        }
        ClientCommand::Delete { id, delete } => cmd_delete::<Client>(data_dir, id, delete.hard),
        ClientCommand::Restore { id } => cmd_restore::<Client>(data_dir, id),
        ClientCommand::Attach { id, files } => cmd_attach::<Client>(data_dir, id, &files),
        ClientCommand::Detach { id, name } => cmd_detach::<Client>(data_dir, id, &name),
    }
}

/// Resolve an order reference (id or number) to its id
fn resolve_order(data_dir: &Path, reference: &str) -> Result<u32> {
    let (_, store) = open_data(data_dir)?;
    Ok(store.find_order(reference)?.id)
}

fn run_order(data_dir: &Path, action: OrderCommand) -> Result<()> {
    match action {
        OrderCommand::Add(args) => {
            let (config, mut store) = open_data(data_dir)?;
            let id = store.add_order(
                NewOrder {
                    client_id: args.client,
                    vendor_id: args.vendor,
                    work_type: args.work,
                    description: args.description,
                    order_date: args.date,
                    due_date: args.due,
                    amount_to_client: args.client_amount,
                    amount_to_vendor: args.vendor_amount,
                },
                &config.orders.number_format,
                Local::now().date_naive(),
            )?;
            store.save(data_dir)?;

            let order = store.get::<Order>(id)?;
            let symbol = &config.orders.currency_symbol;
            println!("Created {}", order.number);
            println!("  Client: {}", store.get::<Client>(order.client_id)?.company_name);
            println!("  Work:   {}", order.work_type);
            println!("  Amount: {}", format_money(order.amount_to_client, symbol));
            println!("  Margin: {}", format_money(order.margin(), symbol));
            Ok(())
        }
        OrderCommand::List(args) => {
            let (config, store) = open_data(data_dir)?;
            let orders = store.listing::<Order>(args.include_deleted);
            let rows = store.order_rows(&orders);
            print_table(&rows, &args, &config, EntityKind::Order)
        }
        OrderCommand::Show { order } => {
            let (_, store) = open_data(data_dir)?;
            let order = store.find_order(&order)?;
            let rows = store.order_rows(&[order]);
            print_details(&format!("Order {}", order.number), &rows[0], order.files());
            Ok(())
        }
        OrderCommand::Edit { order, fields } => {
            let (_, mut store) = open_data(data_dir)?;
            let id = store.find_order(&order)?.id;
            let vendor_id = if fields.no_vendor {
                Some(None)
            } else {
                fields.vendor.map(Some)
            };
            let due_date = if fields.no_due {
                Some(None)
            } else {
                fields.due.map(Some)
            };
            store.update_order(
                id,
                OrderPatch {
                    client_id: fields.client,
                    vendor_id,
                    work_type: fields.work,
                    description: fields.description,
                    order_date: fields.date,
                    due_date,
                    amount_to_client: fields.client_amount,
                    amount_to_vendor: fields.vendor_amount,
                    status: fields.status,
                },
            )?;
            store.save(data_dir)?;
            println!("Updated {}", store.get::<Order>(id)?.number);
            Ok(())
        }
        OrderCommand::Delete { order, delete } => {
            let id = resolve_order(data_dir, &order)?;
            cmd_delete::<Order>(data_dir, id, delete.hard)
        }
        OrderCommand::Restore { order } => {
            let id = resolve_order(data_dir, &order)?;
            cmd_restore::<Order>(data_dir, id)
        }
        OrderCommand::Attach { order, files } => {
            let id = resolve_order(data_dir, &order)?;
            cmd_attach::<Order>(data_dir, id, &files)
        }
        OrderCommand::Detach { order, name } => {
            let id = resolve_order(data_dir, &order)?;
            cmd_detach::<Order>(data_dir, id, &name)
        }
    }
}

fn run_sub_admin(data_dir: &Path, action: SubAdminCommand) -> Result<()> {
    match action {
        SubAdminCommand::Add {
            name,
            email,
            username,
            permissions,
        } => {
            let (_, mut store) = open_data(data_dir)?;
            let id = store.add_sub_admin(NewSubAdmin {
                name,
                email,
                username,
                permissions,
            })?;
            store.save(data_dir)?;
            println!("Added sub-admin #{id} ({})", store.get::<SubAdmin>(id)?.username);
            Ok(())
        }
        SubAdminCommand::List(args) => cmd_list::<SubAdmin>(data_dir, &args),
        SubAdminCommand::Show { id } => {
            let (_, store) = open_data(data_dir)?;
            let admin = store.get::<SubAdmin>(id)?;
            print_details(&format!("Sub-admin #{id}"), admin, &[]);
            Ok(())
        }
        SubAdminCommand::Edit {
            id,
            name,
            email,
            username,
            permissions,
            status,
        } => {
            let (_, mut store) = open_data(data_dir)?;
            store.update_sub_admin(
                id,
                SubAdminPatch {
                    name,
                    email,
                    username,
                    permissions: non_empty(permissions),
                    status,
                },
            )?;
            store.save(data_dir)?;
            println!("Updated sub-admin #{id}");
            Ok(())
        }
        SubAdminCommand::Delete { id, delete } => {
            cmd_delete::<SubAdmin>(data_dir, id, delete.hard)
        }
        SubAdminCommand::Restore { id } => cmd_restore::<SubAdmin>(data_dir, id),
    }
}

fn run_work_type(data_dir: &Path, action: WorkTypeCommand) -> Result<()> {
    match action {
        WorkTypeCommand::Add { name, description } => {
            let (_, mut store) = open_data(data_dir)?;
            let id = store.add_work_type(NewWorkType { name, description })?;
            store.save(data_dir)?;
            println!("Added type of work #{id} ({})", store.get::<WorkType>(id)?.name);
            Ok(())
        }
        WorkTypeCommand::List(args) => cmd_list::<WorkType>(data_dir, &args),
        WorkTypeCommand::Edit {
            id,
            name,
            description,
            active,
            inactive,
        } => {
            let (_, mut store) = open_data(data_dir)?;
            let active = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            store.update_work_type(
                id,
                WorkTypePatch {
                    name,
                    description,
                    active,
                },
            )?;
            store.save(data_dir)?;
            println!("Updated type of work #{id}");
            Ok(())
        }
        WorkTypeCommand::Delete { id, delete } => {
            cmd_delete::<WorkType>(data_dir, id, delete.hard)
        }
        WorkTypeCommand::Restore { id } => cmd_restore::<WorkType>(data_dir, id),
    }
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// "₹1,234.50"
fn format_money(value: f64, currency_symbol: &str) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!(
        "{sign}{currency_symbol}{}.{:02}",
        format_grouped_int(cents / 100),
        cents % 100
    )
}

fn cmd_dashboard(data_dir: &Path) -> Result<()> {
    let (config, store) = open_data(data_dir)?;
    let summary = summarize(&store);
    let symbol = &config.orders.currency_symbol;

    println!("{} Dashboard", config.company.name);
    println!("{}", "-".repeat(50));
    println!("Vendors:          {}", summary.vendors);
    println!("Clients:          {}", summary.clients);
    println!("Orders:           {}", summary.orders);
    println!("Sub-admins:       {}", summary.sub_admins);
    println!("Types of work:    {}", summary.active_work_types);
    println!();

    let mut builder = Builder::default();
    builder.push_record(["STATUS", "ORDERS"]);
    for (status, count) in &summary.orders_by_status {
        builder.push_record([status.to_string(), count.to_string()]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!();

    println!(
        "Billed to clients: {}",
        format_money(summary.billed_to_clients, symbol)
    );
    println!(
        "Paid to vendors:   {}",
        format_money(summary.paid_to_vendors, symbol)
    );
    println!("Margin:            {}", format_money(summary.margin, symbol));

    let recent = recent_orders(&store, 5);
    if !recent.is_empty() {
        println!();
        println!("Recent orders:");
        let rows = store.order_rows(&recent);
        let query = TableQuery {
            columns: Some(
                ["number", "date", "client", "status", "client_amount"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            ..Default::default()
        };
        println!("{}", apply(&rows, &query)?.render());
    }

    Ok(())
}

fn cmd_audit(data_dir: &Path, entity: Option<EntityKind>, limit: usize) -> Result<()> {
    let (_, store) = open_data(data_dir)?;
    let matching: Vec<_> = store
        .audit
        .iter()
        .rev()
        .filter(|e| entity.map_or(true, |kind| e.entity == kind))
        .collect();

    if matching.is_empty() {
        println!("No audit entries yet.");
        return Ok(());
    }

    let shown = &matching[..limit.min(matching.len())];
    let view = apply(shown, &TableQuery::default())?;
    println!("{}", view.render());
    println!("Showing {} of {} entries", shown.len(), matching.len());
    Ok(())
}

/// Build the full (unpaginated unless asked) view used by export
fn export_table(
    store: &Store,
    kind: EntityKind,
    query: &TableQuery,
    include_deleted: bool,
) -> Result<TableView> {
    match kind {
        EntityKind::Vendor => apply(&store.listing::<Vendor>(include_deleted), query),
        EntityKind::Client => apply(&store.listing::<Client>(include_deleted), query),
        EntityKind::Order => {
            let orders = store.listing::<Order>(include_deleted);
            apply(&store.order_rows(&orders), query)
        }
        EntityKind::SubAdmin => apply(&store.listing::<SubAdmin>(include_deleted), query),
        EntityKind::WorkType => apply(&store.listing::<WorkType>(include_deleted), query),
    }
}

fn cmd_export(
    data_dir: &Path,
    kind: EntityKind,
    format: ExportFormat,
    args: &TableArgs,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let (config, mut store) = open_data(data_dir)?;
    let now = Local::now().naive_local();

    let query = args.to_query(config.table.page_size, false)?;
    let view = export_table(&store, kind, &query, args.include_deleted)?;

    let path = output.unwrap_or_else(|| default_export_path(&config, data_dir, kind, format, now));
    export_view(&view, kind, format, &path, &config.company.name, now)?;

    store.record(
        AuditAction::Exported,
        kind,
        None,
        format!("{} rows to {}", view.rows.len(), path.display()),
    );
    store.save(data_dir)?;

    println!(
        "Exported {} {} to {}",
        view.rows.len(),
        kind.plural().replace('-', " "),
        path.display()
    );

    if open {
        open_path(&path)?;
    }
    Ok(())
}

fn open_path(path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()
            .map_err(InnoventoryError::Io)?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()
            .map_err(InnoventoryError::Io)?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(path)
            .spawn()
            .map_err(InnoventoryError::Io)?;
    }
    Ok(())
}
