// src/cli.rs
use crate::config::{self, Config};
use crate::error::{AppError, AppResult};
use crate::models::{Customer, Discount, HistoryEntry, ServiceItem, Vehicle};
use crate::shop::{Bill, CustomerUpdate, DiscountUpdate, ServiceUpdate, Shop, VehicleUpdate};
use clap::{Parser, Subcommand};
use log;
use std::path::PathBuf;

/// Customer, vehicle and service-booking records for a vehicle service shop.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the record files (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the default service and discount catalogs if they are empty
    Init,
    /// Print the effective configuration
    Config,
    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),
    /// Manage vehicles
    #[command(subcommand)]
    Vehicle(VehicleCommand),
    /// Manage the service catalog
    #[command(subcommand)]
    Service(ServiceCommand),
    /// Manage discounts
    #[command(subcommand)]
    Discount(DiscountCommand),
    /// Book services for a customer's vehicle
    Book {
        #[arg(long)]
        customer: i64,
        #[arg(long)]
        vehicle: i64,
        /// Service id; repeat for several services
        #[arg(short, long = "service", required = true)]
        services: Vec<i64>,
        /// Discount id to apply
        #[arg(short, long)]
        discount: Option<i64>,
    },
    /// List all bookings
    History,
    /// Print the bill for a booking
    Bill { history_id: i64 },
    /// Mark one booking as completed
    Complete { history_id: i64 },
    /// Complete a customer's pending bookings and remove the customer and their vehicles
    Checkout { customer_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    Add {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    List,
    Show { id: i64 },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum VehicleCommand {
    Add {
        #[arg(long)]
        customer: i64,
        #[arg(long, default_value = "")]
        reg_no: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long, default_value = "")]
        color: String,
    },
    List {
        /// Only vehicles of this customer
        #[arg(long)]
        customer: Option<i64>,
    },
    Update {
        id: i64,
        #[arg(long)]
        customer: Option<i64>,
        #[arg(long)]
        reg_no: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
    },
    List,
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum DiscountCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        percent: f64,
        #[arg(long, default_value = "")]
        note: String,
    },
    List,
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        percent: Option<f64>,
        #[arg(long)]
        note: Option<String>,
    },
    Delete { id: i64 },
}

fn print_customers(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers found.");
        return;
    }
    println!("{:<6} {:<24} {:<16} {}", "ID", "Name", "Phone", "Email");
    for c in customers {
        println!("{:<6} {:<24} {:<16} {}", c.id, c.name, c.phone, c.email);
    }
}

fn print_vehicles(vehicles: &[Vehicle]) {
    if vehicles.is_empty() {
        println!("No vehicles found.");
        return;
    }
    println!("{:<6} {:<8} {:<14} {:<16} {}", "ID", "CustID", "RegNo", "Model", "Color");
    for v in vehicles {
        println!("{:<6} {:<8} {:<14} {:<16} {}", v.id, v.customer_id, v.reg_no, v.model, v.color);
    }
}

fn print_services(services: &[ServiceItem]) {
    println!("--- Available Services ---");
    for s in services {
        println!("{}. {} - Rs.{}", s.id, s.name, s.price);
    }
}

fn print_discounts(discounts: &[Discount]) {
    println!("--- Discounts ---");
    for d in discounts {
        println!("{}. {} ({}%) {}", d.id, d.name, d.percent, d.note);
    }
}

fn print_history(history: &[HistoryEntry]) {
    if history.is_empty() {
        println!("No service history found.");
        return;
    }
    println!(
        "{:<10} {:<7} {:<6} {:<12} {:<20} {:>10} {:>9} {:>10} {}",
        "HistoryID", "CustID", "VehID", "Services", "DateTime", "Subtotal", "Discount%", "Total", "Status"
    );
    for h in history {
        let services = h.service_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        println!(
            "{:<10} {:<7} {:<6} {:<12} {:<20} {:>10.2} {:>9} {:>10.2} {}",
            h.history_id, h.customer_id, h.vehicle_id, services, h.date_time, h.subtotal, h.discount_percent, h.total, h.status
        );
    }
}

fn print_bill(bill: &Bill) {
    let h = &bill.entry;
    println!("--- BILL ---");
    println!("History ID: {}", h.history_id);
    println!("Customer ID: {}", h.customer_id);
    println!("Vehicle ID: {}", h.vehicle_id);
    println!("Date: {}", h.date_time);
    println!("Services:");
    for s in &bill.lines {
        println!(" - {} : Rs.{:.2}", s.name, s.price);
    }
    println!("Subtotal: Rs.{:.2}", h.subtotal);
    if h.has_discount() {
        println!("Discount #{}: {}% -> -Rs.{:.2}", h.discount_id, h.discount_percent, h.discount_amount());
    } else {
        println!("Discount: none");
    }
    println!("Total: Rs.{:.2}", h.total);
    println!("Status: {}", h.status);
}

fn handle_customer(shop: &Shop, command: CustomerCommand) -> AppResult<()> {
    match command {
        CustomerCommand::Add { name, phone, email } => {
            let c = shop.add_customer(&name, &phone, &email)?;
            println!("Customer added with ID: {}", c.id);
        }
        CustomerCommand::List => print_customers(&shop.customers()?),
        CustomerCommand::Show { id } => {
            let c = shop.find_customer(id)?;
            println!("Found: ID={}, Name={}, Phone={}, Email={}", c.id, c.name, c.phone, c.email);
            print_vehicles(&shop.vehicles_for_customer(id)?);
        }
        CustomerCommand::Update { id, name, phone, email } => {
            shop.update_customer(id, CustomerUpdate { name, phone, email })?;
            println!("Customer updated.");
        }
        CustomerCommand::Delete { id } => {
            shop.delete_customer(id)?;
            println!("Customer deleted.");
        }
    }
    Ok(())
}

fn handle_vehicle(shop: &Shop, command: VehicleCommand) -> AppResult<()> {
    match command {
        VehicleCommand::Add { customer, reg_no, model, color } => {
            let v = shop.register_vehicle(customer, &reg_no, &model, &color)?;
            println!("Vehicle registered with ID: {}", v.id);
        }
        VehicleCommand::List { customer: Some(customer_id) } => {
            print_vehicles(&shop.vehicles_for_customer(customer_id)?)
        }
        VehicleCommand::List { customer: None } => print_vehicles(&shop.vehicles()?),
        VehicleCommand::Update { id, customer, reg_no, model, color } => {
            shop.update_vehicle(id, VehicleUpdate { customer_id: customer, reg_no, model, color })?;
            println!("Vehicle updated.");
        }
        VehicleCommand::Delete { id } => {
            shop.delete_vehicle(id)?;
            println!("Vehicle deleted.");
        }
    }
    Ok(())
}

fn handle_service(shop: &Shop, command: ServiceCommand) -> AppResult<()> {
    match command {
        ServiceCommand::Add { name, price } => {
            let s = shop.add_service(&name, price)?;
            println!("Service added with ID: {}", s.id);
        }
        ServiceCommand::List => print_services(&shop.services()?),
        ServiceCommand::Update { id, name, price } => {
            shop.update_service(id, ServiceUpdate { name, price })?;
            println!("Service updated.");
        }
        ServiceCommand::Delete { id } => {
            shop.delete_service(id)?;
            println!("Service deleted.");
        }
    }
    Ok(())
}

fn handle_discount(shop: &Shop, command: DiscountCommand) -> AppResult<()> {
    match command {
        DiscountCommand::Add { name, percent, note } => {
            let d = shop.add_discount(&name, percent, &note)?;
            println!("Discount added with ID: {}", d.id);
        }
        DiscountCommand::List => print_discounts(&shop.discounts()?),
        DiscountCommand::Update { id, name, percent, note } => {
            shop.update_discount(id, DiscountUpdate { name, percent, note })?;
            println!("Discount updated.");
        }
        DiscountCommand::Delete { id } => {
            shop.delete_discount(id)?;
            println!("Discount deleted.");
        }
    }
    Ok(())
}

/// Runs one parsed command against the stores described by `config`.
pub fn handle_cli_command(cli: Cli, mut config: Config) -> AppResult<()> {
    log::debug!("Handling CLI command: {:?}", cli.command);
    if let Some(dir) = cli.data_dir {
        log::info!("Using data directory from command line: {:?}", dir);
        config.data_dir = dir;
    }
    let shop = Shop::from_config(&config);
    if config.seed_defaults {
        shop.ensure_defaults()?;
    }

    match cli.command {
        Commands::Init => {
            shop.ensure_defaults()?;
            println!("Data directory ready at {:?}.", config.data_dir);
        }
        Commands::Config => {
            if let Some(path) = config::get_config_path() {
                println!("# {}", path.display());
            }
            let rendered = toml::to_string_pretty(&config).map_err(crate::error::ConfigError::from)?;
            print!("{}", rendered);
        }
        Commands::Customer(command) => handle_customer(&shop, command)?,
        Commands::Vehicle(command) => handle_vehicle(&shop, command)?,
        Commands::Service(command) => handle_service(&shop, command)?,
        Commands::Discount(command) => handle_discount(&shop, command)?,
        Commands::Book { customer, vehicle, services, discount } => {
            let entry = shop.book_service(customer, vehicle, &services, discount)?;
            println!("Subtotal: Rs.{:.2}", entry.subtotal);
            println!("Discount: {:.2}% -> -Rs.{:.2}", entry.discount_percent, entry.discount_amount());
            println!("Total: Rs.{:.2}", entry.total);
            println!("Booking saved with History ID: {}", entry.history_id);
        }
        Commands::History => print_history(&shop.history()?),
        Commands::Bill { history_id } => print_bill(&shop.bill(history_id)?),
        Commands::Complete { history_id } => {
            shop.mark_completed(history_id)?;
            println!("Marked completed.");
        }
        Commands::Checkout { customer_id } => {
            let checkout = shop.checkout_customer(customer_id)?;
            if checkout.completed == 0 {
                println!("No pending services found for customer {}.", customer_id);
            } else {
                println!(
                    "Marked {} pending service(s) for customer {} as Completed.",
                    checkout.completed, customer_id
                );
                println!("{} vehicle(s) deleted.", checkout.vehicles_removed);
                if checkout.customer_removed {
                    println!("Customer {} deleted.", customer_id);
                } else {
                    println!("Customer {} not found.", customer_id);
                }
            }
        }
    }
    Ok(())
}

/// Rejects option combinations clap cannot express.
pub fn validate(cli: &Cli) -> AppResult<()> {
    if let Commands::Book { services, .. } = &cli.command {
        if services.iter().any(|id| *id <= 0) {
            return Err(AppError::Cli("Service ids must be positive.".to_string()));
        }
    }
    Ok(())
}
