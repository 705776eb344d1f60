//! Full backup/restore cycle walkthrough
//!
//! This example demonstrates:
//! - Registering storage nodes
//! - Creating a backup request
//! - Assigning nodes and reporting completion
//! - Looking up stored copies
//! - Restoring the file from a chosen node
//!
//! Run with: cargo run --example backup_cycle

use replivault_core::{BackupCoordinator, CallContext, CoordinatorConfig, PrincipalId};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("🗄️  Replivault - Backup Cycle Example\n");

    let coordinator = BackupCoordinator::new(CoordinatorConfig::new("owner"));
    let node_1 = PrincipalId::new("node-1");

    // ==================== Node Registration ====================

    println!("📡 Registering node-1 with 1000 units of capacity...");
    coordinator.register_node(&CallContext::new("node-1", 1), 1000)?;
    let record = coordinator
        .node(&node_1)
        .expect("node-1 was just registered");
    println!(
        "   ✅ Registered (reputation {}, free capacity {})",
        record.reputation,
        record.free_capacity()
    );

    // ==================== Backup Request ====================

    println!("\n📦 Creating a backup request for a 500-unit file...");
    let backup_id = coordinator.create_backup_request(
        &CallContext::new("alice", 2),
        "hash123",
        500,
        2, // priority
        3, // required replicas
        10,
    )?;
    println!("   ✅ Backup request {backup_id} created");

    println!("\n🔗 Assigning backup {backup_id} to node-1...");
    coordinator.assign_backup(&CallContext::new("owner", 3), backup_id, &node_1)?;
    let request = coordinator
        .backup_request(backup_id)
        .expect("request exists");
    println!("   ✅ Request status: {}", request.status.as_str());

    println!("\n📤 node-1 reports its copy complete...");
    coordinator.report_backup_completion(&CallContext::new("node-1", 4), backup_id, "hash123")?;
    let location = coordinator
        .backup_location("hash123", &node_1)
        .expect("location recorded on completion");
    println!(
        "   ✅ Copy recorded (backup {}, verified: {})",
        location.backup_id, location.verified
    );
    let record = coordinator.node(&node_1).expect("node-1 exists");
    println!(
        "   📊 node-1: {} successful, {} used capacity",
        record.successful_backups, record.used
    );

    // ==================== Restore ====================

    println!("\n📥 Alice requests a restore from node-1...");
    let restore_id = coordinator.create_restore_request(
        &CallContext::new("alice", 5),
        "hash123",
        Some(node_1.clone()),
        5,
    )?;
    println!("   ✅ Restore request {restore_id} created");

    println!("\n🚚 node-1 serves the restore...");
    coordinator.complete_restore(&CallContext::new("node-1", 6), restore_id)?;
    let restore = coordinator
        .restore_request(restore_id)
        .expect("restore exists");
    println!("   ✅ Restore status: {}", restore.status.as_str());

    println!("\n✨ Done");
    Ok(())
}
