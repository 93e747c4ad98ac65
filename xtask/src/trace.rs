//! `cargo xtask trace`: drive the xfer engines against simulated registers
//! and print the resulting register access trace.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use xfer::dma::regs as dma_regs;
use xfer::dma::{channel_register, ChannelDescriptor, DataWidth, GpDma, Outcome, GPDMA1_BASE};
use xfer::quadspi::{config, regs as qspi_regs, QuadSpi, Status, QUADSPI_BASE};
use xfer::{Access, AccessKind, SimRegisters};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Read the W25Q128JV JEDEC ID over QUADSPI
    Jedec,
    /// Memory-to-memory copy on GPDMA1 channel 0
    Gpdma,
    /// Both of the above
    All,
}

pub fn run(scenario: Scenario, log: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log).with_context(|| format!("Invalid log filter '{log}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    if matches!(scenario, Scenario::Jedec | Scenario::All) {
        jedec()?;
    }
    if matches!(scenario, Scenario::Gpdma | Scenario::All) {
        gpdma()?;
    }
    Ok(())
}

fn jedec() -> Result<()> {
    println!();
    println!("{}", "QUADSPI: read JEDEC ID".cyan().bold());

    let mut regs = SimRegisters::new();
    regs.set(
        QUADSPI_BASE.wrapping_add(qspi_regs::SR),
        (Status::FIFO_THRESHOLD | Status::TRANSFER_COMPLETE).bits(),
    );
    for byte in config::JEDEC_ID {
        regs.queue_read(QUADSPI_BASE.wrapping_add(qspi_regs::DR), u32::from(byte));
    }

    let mut qspi = QuadSpi::new(regs, QUADSPI_BASE);
    let mut id = [0u8; 3];
    qspi.read(&config::read_jedec_id(), &mut id)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("JEDEC ID read failed")?;

    print_trace(qspi.regs(), qspi_name);
    let [manufacturer, kind, capacity] = id;
    println!(
        "{}",
        format!("  ✓ JEDEC ID {manufacturer:02X} {kind:02X} {capacity:02X}").green()
    );
    Ok(())
}

fn gpdma() -> Result<()> {
    println!();
    println!("{}", "GPDMA1: channel 0 memory-to-memory copy".cyan().bold());

    let csr = channel_register(GPDMA1_BASE, 0, dma_regs::CSR);
    let ccr = channel_register(GPDMA1_BASE, 0, dma_regs::CCR);
    let mut regs = SimRegisters::new();
    regs.self_clearing(ccr, dma_regs::CCR_RESET.mask(), 0b111);
    regs.queue_read(csr, 0);
    regs.set(
        csr,
        dma_regs::ChannelFlags::TRANSFER_COMPLETE.bits() | dma_regs::CSR_IDLEF.mask(),
    );

    let mut dma = GpDma::gpdma1(regs);
    let desc =
        ChannelDescriptor::memory_to_memory(0x2000_0000, 0x2400_0000, 1024, DataWidth::Word);
    let outcome = {
        let mut ch = dma
            .channel(0)
            .and_then(|ch| ch.configure(&desc))
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("GPDMA setup failed")?
            .enable();
        let outcome = ch.wait().map_err(|e| anyhow::anyhow!("{e}"))?;
        ch.disable().map_err(|e| anyhow::anyhow!("{e}"))?;
        outcome
    };

    print_trace(dma.regs(), gpdma_name);
    match outcome {
        Outcome::Completed => println!("{}", "  ✓ transfer completed".green()),
        Outcome::Error(flags) => {
            println!("{}", format!("  ✗ transfer error, CSR flags {:#x}", flags.bits()).red());
        }
        Outcome::Running | Outcome::Suspended => {
            println!("{}", "  ⚠ transfer did not complete".yellow());
        }
    }
    Ok(())
}

fn print_trace(regs: &SimRegisters, name: fn(usize) -> Option<&'static str>) {
    for (i, access) in regs.trace().iter().enumerate() {
        let Access {
            kind, addr, value, ..
        } = *access;
        let label = name(addr).unwrap_or("?");
        let line = format!("  {i:>3}  {label:<6} {addr:#010x}  {value:#010x}");
        match kind {
            AccessKind::Read => println!("{} {}", "R".blue(), line.dimmed()),
            AccessKind::Write => println!("{} {}", "W".yellow().bold(), line),
        }
    }
    if regs.dropped() > 0 {
        println!("{}", format!("  ({} accesses not recorded)", regs.dropped()).yellow());
    }
    if regs.overflowed() > 0 {
        let lost = format!("  ({} register values lost, table full)", regs.overflowed());
        println!("{}", lost.red());
    }
}

fn qspi_name(addr: usize) -> Option<&'static str> {
    use qspi_regs::{ABR, AR, CCR, CR, DCR, DLR, DR, FCR, SR};
    let offset = addr.checked_sub(QUADSPI_BASE)?;
    [
        (CR, "CR"),
        (DCR, "DCR"),
        (SR, "SR"),
        (FCR, "FCR"),
        (DLR, "DLR"),
        (CCR, "CCR"),
        (AR, "AR"),
        (ABR, "ABR"),
        (DR, "DR"),
    ]
    .into_iter()
    .find_map(|(o, n)| (o == offset).then_some(n))
}

fn gpdma_name(addr: usize) -> Option<&'static str> {
    use dma_regs::{CBR1, CCR, CDAR, CFCR, CLBAR, CLLR, CSAR, CSR, CTR1, CTR2, CTR3};
    [
        (CLBAR, "CLBAR"),
        (CFCR, "CFCR"),
        (CSR, "CSR"),
        (CCR, "CCR"),
        (CTR1, "CTR1"),
        (CTR2, "CTR2"),
        (CBR1, "CBR1"),
        (CSAR, "CSAR"),
        (CDAR, "CDAR"),
        (CTR3, "CTR3"),
        (CLLR, "CLLR"),
    ]
    .into_iter()
    .find_map(|(o, n)| (channel_register(GPDMA1_BASE, 0, o) == addr).then_some(n))
}
