use anyhow::Result;

pub fn run(package: String) -> Result<()> {
    let manager = super::manager()?;
    let report = manager.install(&package)?;
    println!("{}", report);
    Ok(())
}
