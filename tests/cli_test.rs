use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn catalog_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id, name, price, stock, active").unwrap();
    writeln!(file, "1, Hoodie, 25.00, 5, true").unwrap();
    writeln!(file, "2, Shirt, 10.00, 2, true").unwrap();
    file
}

#[test]
fn test_checkout_and_lifecycle_replay() {
    let catalog = catalog_file();

    let mut events = NamedTempFile::new().unwrap();
    writeln!(events, "event, user, reference, quantity, amount, text, note").unwrap();
    writeln!(events, "register, alice, , , , alice@example.com, 12 Main St").unwrap();
    writeln!(events, "register, bob, , , , bob@example.com,").unwrap();
    writeln!(events, "cart_add, alice, 1, 2, , ,").unwrap();
    writeln!(events, "checkout, alice, , , , ,").unwrap();
    writeln!(events, "order_status, , 1, , , in_process,").unwrap();
    // bob asks for more shirts than exist; the attempt must fail whole
    writeln!(events, "cart_add, bob, 2, 5, , ,").unwrap();
    writeln!(events, "checkout, bob, , , , ,").unwrap();

    let mut cmd = Command::new(cargo_bin!("atelier-core"));
    cmd.arg(catalog.path()).arg(events.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("order,customer,status,total"))
        .stdout(predicate::str::contains("1,alice,in_process,50.00"))
        .stderr(predicate::str::contains(
            "Shirt (available: 2, requested: 5)",
        ));
}

#[test]
fn test_quote_workflow_replay() {
    let catalog = catalog_file();

    let mut events = NamedTempFile::new().unwrap();
    writeln!(events, "event, user, reference, quantity, amount, text, note").unwrap();
    writeln!(events, "register, alice, , , , alice@example.com,").unwrap();
    writeln!(events, "quote_submit, alice, , , , hoodie, embroidered hood").unwrap();
    writeln!(events, "quote_status, , 1, , , reviewed, looks feasible").unwrap();
    writeln!(events, "quote_price, , 1, , 120.00, ,").unwrap();
    writeln!(events, "quote_reply, alice, 1, , , accept,").unwrap();
    // settled requests are immutable; this row must fail
    writeln!(events, "quote_status, , 1, , , rejected, too late").unwrap();

    let mut cmd = Command::new(cargo_bin!("atelier-core"));
    cmd.arg(catalog.path()).arg(events.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("settled"));
}

#[test]
fn test_blocked_customer_cannot_check_out() {
    let catalog = catalog_file();

    let mut events = NamedTempFile::new().unwrap();
    writeln!(events, "event, user, reference, quantity, amount, text, note").unwrap();
    writeln!(events, "register, mallory, , , , mallory@example.com,").unwrap();
    writeln!(events, "block, mallory, , , , ,").unwrap();
    writeln!(events, "cart_add, mallory, 1, 1, , ,").unwrap();
    writeln!(events, "checkout, mallory, , , , ,").unwrap();

    let mut cmd = Command::new(cargo_bin!("atelier-core"));
    cmd.arg(catalog.path()).arg(events.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("mallory").not())
        .stderr(predicate::str::contains("blocked"));
}

#[test]
fn test_discontinuation_rejects_open_orders() {
    let catalog = catalog_file();

    let mut events = NamedTempFile::new().unwrap();
    writeln!(events, "event, user, reference, quantity, amount, text, note").unwrap();
    writeln!(events, "register, alice, , , , alice@example.com,").unwrap();
    writeln!(events, "cart_add, alice, 1, 1, , ,").unwrap();
    writeln!(events, "checkout, alice, , , , ,").unwrap();
    writeln!(events, "discontinue, , 1, , , ,").unwrap();
    // the rejected order cannot be re-opened afterwards
    writeln!(events, "order_status, , 1, , , in_process,").unwrap();

    let mut cmd = Command::new(cargo_bin!("atelier-core"));
    cmd.arg(catalog.path()).arg(events.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,alice,rejected,25.00"))
        .stderr(predicate::str::contains("cannot move from rejected"));
}
