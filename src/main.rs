use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Table};
use inquire::{Confirm, DateSelect, MultiSelect, Select, Text};
use tracing_subscriber::EnvFilter;

use facture::api::{FactureApi, HttpApi};
use facture::config::{Settings, config_path};
use facture::draft::DraftLine;
use facture::format::{format_amount, format_date, progress_section};
use facture::model::{Invoice, InvoiceId, Payment, PaymentId, PaymentStatus};
use facture::payment::invoice_progress;
use facture::screens::{Banner, Dashboard, Detail, EditorScreen, ListScreen, Listing, PaymentsScreen};
use facture::share::{fallback_share_url, pdf_file_name, share_message};
use facture::totals::line_amount;
use facture::Result;

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "facture", about = "Manage invoices on a remote invoicing API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List invoices (paginated)
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// IMPAYEE, PARTIELLEMENT_PAYEE or PAYEE
        #[arg(long, conflicts_with = "search")]
        status: Option<PaymentStatus>,
        /// Full-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one invoice with its lines and payment progress
    Show {
        id: InvoiceId,
        /// Print the server's preview document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new invoice
    New,
    /// Edit an existing invoice
    Edit { id: InvoiceId },
    /// Delete one or more invoices
    Delete {
        ids: Vec<InvoiceId>,
        /// Pick invoices from the first page instead of passing ids
        #[arg(long)]
        pick: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List the payments recorded on an invoice
    Payments { id: InvoiceId },
    /// Record a payment
    Pay {
        id: InvoiceId,
        #[arg(long)]
        amount: Option<String>,
        /// Payment date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a recorded payment
    Unpay {
        id: InvoiceId,
        payment_id: PaymentId,
        #[arg(long)]
        yes: bool,
    },
    /// Download the invoice PDF
    Pdf {
        id: InvoiceId,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Open the invoice PDF in the default viewer
    View { id: InvoiceId },
    /// Share the invoice
    Share { id: InvoiceId },
    /// Payment statistics and recent invoices
    Stats,
    /// Invoices with a remaining balance
    Outstanding {
        #[arg(long, default_value_t = 0, conflicts_with = "all")]
        page: u32,
        /// Every outstanding invoice on one page
        #[arg(long)]
        all: bool,
    },
    /// Configure the API endpoint and display options
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "facture=warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        return;
    };

    if let Err(e) = run(command) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    if matches!(command, Commands::Config) {
        setup_config_wizard()?;
        return Ok(());
    }

    let settings = Settings::load()?;
    let api = HttpApi::new(&settings)?;
    tracing::debug!(api_url = %settings.api_url, "settings loaded");

    match command {
        Commands::List { page, status, search } => {
            let listing = match (status, search) {
                (Some(status), _) => Listing::Status(status),
                (None, Some(term)) => Listing::search(&term),
                (None, None) => Listing::All,
            };
            list_invoices(&api, &settings, listing, page);
        }
        Commands::Outstanding { all: true, .. } => {
            let invoices = api.outstanding()?;
            print_invoice_table(&invoices, &settings);
            println!("{} invoice(s) with a balance due", invoices.len());
        }
        Commands::Outstanding { page, .. } => list_invoices(&api, &settings, Listing::Outstanding, page),
        Commands::Show { id, json: true } => {
            let preview = api.preview(id)?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::Show { id, .. } => show_invoice(&api, &settings, id),
        Commands::New => {
            let screen = EditorScreen::create(&api);
            edit_draft(screen, &settings)?;
        }
        Commands::Edit { id } => match EditorScreen::edit(&api, id) {
            Ok(screen) => edit_draft(screen, &settings)?,
            Err(detail) => print_detail_failure(&detail),
        },
        Commands::Delete { ids, pick, yes } => delete_invoices(&api, &settings, ids, pick, yes)?,
        Commands::Payments { id } => {
            let mut screen = PaymentsScreen::new(&api, id, &settings.currency);
            if screen.load() {
                print_payments_screen(&screen, &settings);
                match api.total_paid(id) {
                    Ok(total) => println!("Total recorded: {}", format_amount(Some(total), &settings.currency)),
                    Err(e) => tracing::warn!(error = %e, "could not fetch the payments total"),
                }
            } else {
                print_banner(screen.banner.as_ref());
            }
        }
        Commands::Pay { id, amount, date } => record_payment(&api, &settings, id, amount, date)?,
        Commands::Unpay { id, payment_id, yes } => {
            if !yes && !confirm("Do you really want to delete this payment?")? {
                println!("Cancelled");
                return Ok(());
            }
            let mut screen = PaymentsScreen::new(&api, id, &settings.currency);
            screen.delete_payment(payment_id);
            print_payments_screen(&screen, &settings);
        }
        Commands::Pdf { id, output } => download_pdf(&api, id, output)?,
        Commands::View { id } => view_pdf(&api, id)?,
        Commands::Share { id } => share_invoice(&api, &settings, id)?,
        Commands::Stats => show_stats(&api, &settings),
        Commands::Config => {}
    }
    Ok(())
}

// ==========================================
// 1. Listing & Deletion
// ==========================================

fn list_invoices(api: &HttpApi, settings: &Settings, listing: Listing, page: u32) {
    let mut screen = ListScreen::new(api, settings.page_size);
    screen.set_listing(listing);
    if screen.load(page) {
        print_invoice_table(&screen.invoices, settings);
        let p = screen.pagination;
        println!(
            "Page {}/{} ({} invoice(s))",
            p.current_page + 1,
            p.total_pages.max(1),
            p.total_items
        );
    }
    print_banner(screen.banner.as_ref());
}

fn delete_invoices(api: &HttpApi, settings: &Settings, ids: Vec<InvoiceId>, pick: bool, yes: bool) -> Result<()> {
    let mut screen = ListScreen::new(api, settings.page_size);
    if !screen.load(0) {
        print_banner(screen.banner.as_ref());
        return Ok(());
    }

    if pick {
        let options: Vec<String> = screen.invoices.iter().map(invoice_option).collect();
        let chosen = MultiSelect::new("Select invoices to delete:", options.clone())
            .with_page_size(10)
            .prompt()?;
        for (invoice, label) in screen.invoices.iter().zip(&options) {
            if chosen.contains(label) {
                screen.selection.select(invoice.id);
            }
        }
    } else {
        for id in ids {
            screen.selection.select(id);
        }
    }

    let count = screen.selection.len();
    if count == 0 {
        println!("❌ No invoice selected.");
        return Ok(());
    }

    let question = if count == 1 {
        "Do you really want to delete this invoice?".to_string()
    } else {
        format!("Do you really want to delete {count} invoices?")
    };
    if !yes && !confirm(&question)? {
        println!("Cancelled");
        return Ok(());
    }

    if count == 1 {
        let id = screen.selection.ids()[0];
        screen.delete(id);
    } else {
        screen.delete_selected();
    }
    print_banner(screen.banner.as_ref());
    Ok(())
}

fn invoice_option(invoice: &Invoice) -> String {
    format!("#{} | {} | {}", invoice.id, invoice.invoice_number, invoice.client_name)
}

// ==========================================
// 2. Detail View
// ==========================================

fn show_invoice(api: &HttpApi, settings: &Settings, id: InvoiceId) {
    match Detail::load(api, id) {
        Detail::Loaded(invoice) => print_invoice(&invoice, settings),
        other => print_detail_failure(&other),
    }
}

fn print_detail_failure(detail: &Detail) {
    match detail {
        Detail::NotFound => {
            println!("❌ Invoice not found.");
            println!("↩️  Back to the list: facture list");
        }
        Detail::Failed(message) => println!("❌ {}", message),
        Detail::Loaded(_) => {}
    }
}

fn print_invoice(invoice: &Invoice, settings: &Settings) {
    let currency = settings.currency.as_str();
    println!("\n🧾 Invoice {}", invoice.invoice_number);
    println!("Client: {}", invoice.client_name);
    println!("Date:   {}", format_date(invoice.issue_date));

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Description"),
        Cell::new("Qty"),
        Cell::new("Unit price"),
        Cell::new("Amount"),
    ]);
    for line in &invoice.lines {
        table.add_row(vec![
            Cell::new(&line.description),
            Cell::new(line.quantity),
            Cell::new(format_amount(Some(line.unit_price), currency)),
            Cell::new(format_amount(Some(line.amount()), currency)),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!("{} item(s)", invoice.lines.len())).add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format_amount(Some(invoice.total), currency)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if let Some(words) = invoice.total_in_words.as_deref().filter(|w| !w.trim().is_empty()) {
        println!("In words: {}", words);
    }
    print_progress(invoice, currency);
}

fn print_progress(invoice: &Invoice, currency: &str) {
    println!();
    for line in progress_section(invoice, currency) {
        println!("{}", line);
    }
}

// ==========================================
// 3. Draft Editor
// ==========================================

const SUBMIT_OPT: &str = "💾 Submit";
const ADD_LINE_OPT: &str = "➕ Add line";
const EDIT_LINE_OPT: &str = "✏️  Edit line";
const REMOVE_LINE_OPT: &str = "🗑️  Remove line";
const CLIENT_OPT: &str = "👤 Change client";
const CANCEL_OPT: &str = "❌ Discard";

fn edit_draft<A: FactureApi>(mut screen: EditorScreen<'_, A>, settings: &Settings) -> Result<()> {
    let currency = settings.currency.as_str();

    if screen.draft.client_name.trim().is_empty() {
        screen.draft.client_name = Text::new("Client name:").prompt()?;
        println!("\n--- Enter Invoice Lines ---");
        println!("(Leave Description empty to finish)");
        let first = prompt_line(&DraftLine::blank())?;
        if let Some(line) = first {
            if let Some(slot) = screen.draft.line_mut(0) {
                *slot = line;
            }
            print_draft(&screen, currency);
            while let Some(line) = prompt_line(&DraftLine::blank())? {
                screen.draft.push_line(line);
                print_draft(&screen, currency);
            }
        }
    }

    loop {
        print_draft(&screen, currency);
        let options = vec![SUBMIT_OPT, ADD_LINE_OPT, EDIT_LINE_OPT, REMOVE_LINE_OPT, CLIENT_OPT, CANCEL_OPT];
        let choice = Select::new("What next?", options).prompt()?;

        match choice {
            SUBMIT_OPT => {
                let saved = screen.submit().cloned();
                print_banner(screen.banner.take().as_ref());
                if let Some(invoice) = saved {
                    print_invoice(&invoice, settings);
                    return Ok(());
                }
            }
            ADD_LINE_OPT => {
                if let Some(line) = prompt_line(&DraftLine::blank())? {
                    screen.draft.push_line(line);
                }
            }
            EDIT_LINE_OPT => {
                let index = pick_line(&screen, "Line to edit:")?;
                let current = screen.draft.lines()[index].clone();
                if let Some(line) = prompt_line(&current)? {
                    if let Some(slot) = screen.draft.line_mut(index) {
                        *slot = DraftLine { id: current.id, ..line };
                    }
                }
            }
            REMOVE_LINE_OPT => {
                let index = pick_line(&screen, "Line to remove:")?;
                if !screen.remove_line(index) {
                    print_banner(screen.banner.take().as_ref());
                }
            }
            CLIENT_OPT => {
                let name = Text::new("Client name:")
                    .with_default(&screen.draft.client_name)
                    .prompt()?;
                screen.draft.client_name = name;
            }
            _ => {
                println!("Draft discarded.");
                return Ok(());
            }
        }
    }
}

/// Prompts for one line. `None` when the description is left empty.
fn prompt_line(current: &DraftLine) -> Result<Option<DraftLine>> {
    let description = Text::new("Description:").with_default(&current.description).prompt()?;
    if description.trim().is_empty() {
        return Ok(None);
    }
    let quantity = Text::new("Quantity:").with_default(&current.quantity).prompt()?;
    let unit_price = Text::new("Unit price:").with_default(&current.unit_price).prompt()?;
    Ok(Some(DraftLine::new(quantity, unit_price, description)))
}

fn pick_line<A: FactureApi>(screen: &EditorScreen<'_, A>, prompt: &str) -> Result<usize> {
    let options: Vec<String> = screen
        .draft
        .lines()
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{}. {} ({} x {})", i + 1, l.description, l.quantity, l.unit_price))
        .collect();
    let choice = Select::new(prompt, options.clone()).prompt()?;
    Ok(options.iter().position(|o| *o == choice).unwrap_or(0))
}

fn print_draft<A: FactureApi>(screen: &EditorScreen<'_, A>, currency: &str) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Description"),
        Cell::new("Qty"),
        Cell::new("Unit price"),
        Cell::new("Amount"),
    ]);
    for (i, line) in screen.draft.lines().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&line.description),
            Cell::new(&line.quantity),
            Cell::new(&line.unit_price),
            Cell::new(format_amount(Some(line_amount(line)), currency)),
        ]);
    }
    println!("\nClient: {}", screen.draft.client_name);
    println!("{table}");
    println!("💰 Total: {}", format_amount(Some(screen.draft.total()), currency));
}

// ==========================================
// 4. Payments
// ==========================================

fn record_payment(
    api: &HttpApi,
    settings: &Settings,
    id: InvoiceId,
    amount: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let mut screen = PaymentsScreen::new(api, id, &settings.currency);
    if !screen.load() {
        print_banner(screen.banner.as_ref());
        return Ok(());
    }
    print_payments_screen(&screen, settings);

    let remaining = format_amount(Some(screen.remaining()), &settings.currency);
    let amount = match amount {
        Some(amount) => amount,
        None => Text::new(&format!("Amount (remaining {remaining}):")).prompt()?,
    };
    let date = match date {
        Some(date) => date,
        None => DateSelect::new("Payment date:")
            .with_default(Local::now().date_naive())
            .prompt()?,
    };

    screen.add_payment(&amount, date);
    print_payments_screen(&screen, settings);
    Ok(())
}

fn print_payments_screen<A: FactureApi>(screen: &PaymentsScreen<'_, A>, settings: &Settings) {
    let currency = settings.currency.as_str();
    if let Some(invoice) = &screen.invoice {
        println!("\n🧾 Invoice {} ({})", invoice.invoice_number, invoice.client_name);
        println!("Total: {}", format_amount(Some(invoice.total), currency));
        print_progress(invoice, currency);
    }
    print_payment_table(&screen.payments, currency);
    print_banner(screen.banner.as_ref());
}

fn print_payment_table(payments: &[Payment], currency: &str) {
    if payments.is_empty() {
        println!("(No payments recorded)");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![Cell::new("ID"), Cell::new("Date"), Cell::new("Amount")]);
    for payment in payments {
        table.add_row(vec![
            Cell::new(payment.id),
            Cell::new(format_date(payment.payment_date)),
            Cell::new(format_amount(Some(payment.amount), currency)),
        ]);
    }
    println!("{table}");
}

// ==========================================
// 5. PDF & Sharing
// ==========================================

fn download_pdf(api: &HttpApi, id: InvoiceId, output: Option<PathBuf>) -> Result<()> {
    let invoice = api.get(id)?;
    let file_name = pdf_file_name(&invoice);

    let target = match output {
        Some(path) => path,
        None => rfd::FileDialog::new()
            .set_title("Save invoice PDF")
            .set_file_name(&file_name)
            .save_file()
            .unwrap_or_else(|| PathBuf::from(&file_name)),
    };

    let bytes = api.download_pdf(id)?;
    fs::write(&target, bytes)?;
    println!("✅ PDF saved: {:?}", target);
    open_and_reveal(&target);
    Ok(())
}

fn view_pdf(api: &HttpApi, id: InvoiceId) -> Result<()> {
    let invoice = api.get(id)?;
    let bytes = api.view_pdf(id)?;
    let path = std::env::temp_dir().join(pdf_file_name(&invoice));
    fs::write(&path, bytes)?;
    println!("🚀 Opening: {:?}", path);
    open_target(path.as_os_str());
    Ok(())
}

fn share_invoice(api: &HttpApi, settings: &Settings, id: InvoiceId) -> Result<()> {
    let invoice = api.get(id)?;
    let message = share_message(&invoice, settings)?;

    // Keep a local copy so it can be attached by hand.
    let path = std::env::temp_dir().join(pdf_file_name(&invoice));
    match api.download_pdf(id) {
        Ok(bytes) => {
            fs::write(&path, bytes)?;
            println!("📎 PDF ready to attach: {:?}", path);
        }
        Err(e) => tracing::warn!(error = %e, "could not fetch the PDF for sharing"),
    }

    println!("\n{}\n", message);
    let url = fallback_share_url(&message, &settings.pdf_url(id))?;
    println!("🔗 {}", url);
    open_target(OsStr::new(url.as_str()));
    Ok(())
}

// ==========================================
// 6. Dashboard
// ==========================================

fn show_stats(api: &HttpApi, settings: &Settings) {
    let currency = settings.currency.as_str();
    let dashboard = match Dashboard::load(api, 5) {
        Ok(dashboard) => dashboard,
        Err(banner) => {
            print_banner(Some(&banner));
            return;
        }
    };
    let stats = &dashboard.stats;

    let mut table = Table::new();
    table.set_header(vec![Cell::new("Figure"), Cell::new("Value")]);
    table.add_row(vec![Cell::new("Invoices"), Cell::new(stats.invoice_count.unwrap_or(0))]);
    table.add_row(vec![Cell::new("Invoiced"), Cell::new(format_amount(stats.invoiced_total, currency))]);
    table.add_row(vec![
        Cell::new("Collected"),
        Cell::new(format_amount(stats.paid_total, currency)).fg(PaymentStatus::Paid.display().color),
    ]);
    table.add_row(vec![
        Cell::new("Outstanding"),
        Cell::new(format_amount(stats.remaining_total, currency)).fg(PaymentStatus::Unpaid.display().color),
    ]);
    for (status, count) in [
        (PaymentStatus::Unpaid, stats.unpaid_count),
        (PaymentStatus::PartiallyPaid, stats.partially_paid_count),
        (PaymentStatus::Paid, stats.paid_count),
    ] {
        let display = status.display();
        table.add_row(vec![Cell::new(display.label).fg(display.color), Cell::new(count.unwrap_or(0))]);
    }

    println!("\n--- Payment Summary ---");
    println!("{table}");
    println!("\n--- Recent Invoices ---");
    print_invoice_table(&dashboard.recent, settings);
}

// ==========================================
// 7. Config & Utilities
// ==========================================

fn setup_config_wizard() -> Result<Settings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let path = config_path();
    let current = Settings::load_from(&path)?;

    let api_url = Text::new("API base URL:").with_default(&current.api_url).prompt()?;
    let page_size = Text::new("Invoices per page:")
        .with_default(&current.page_size.to_string())
        .prompt()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(current.page_size);
    let currency = Text::new("Currency label:").with_default(&current.currency).prompt()?;

    let settings = Settings { api_url, page_size, currency, ..current };
    settings.save_to(&path)?;
    println!("✅ Settings saved to {:?}", path);
    Ok(settings)
}

fn confirm(question: &str) -> Result<bool> {
    Ok(Confirm::new(question).with_default(false).prompt()?)
}

fn print_banner(banner: Option<&Banner>) {
    match banner {
        Some(Banner::Error(message)) => println!("❌ {}", message),
        Some(Banner::Success(message)) => println!("✅ {}", message),
        None => {}
    }
}

fn print_invoice_table(invoices: &[Invoice], settings: &Settings) {
    if invoices.is_empty() {
        println!("(None found)");
        return;
    }
    let currency = settings.currency.as_str();
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Number"),
        Cell::new("Client"),
        Cell::new("Date"),
        Cell::new("Total"),
        Cell::new("Remaining"),
        Cell::new("Status"),
    ]);
    for invoice in invoices {
        let progress = invoice_progress(invoice);
        let display = progress.status.display();
        table.add_row(vec![
            Cell::new(invoice.id),
            Cell::new(&invoice.invoice_number),
            Cell::new(&invoice.client_name),
            Cell::new(format_date(invoice.issue_date)),
            Cell::new(format_amount(Some(invoice.total), currency)),
            Cell::new(format_amount(Some(progress.amount_remaining), currency)),
            Cell::new(display.label).fg(display.color),
        ]);
    }
    println!("{table}");
}

fn open_target(target: &OsStr) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(target).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(target).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(target).spawn().ok();
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(format!("/select,{}", path.to_string_lossy())).spawn().ok();

    open_target(path.as_os_str());
}
