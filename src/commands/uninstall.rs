use anyhow::Result;

pub fn run(package: String) -> Result<()> {
    let manager = super::manager()?;
    println!("{}", manager.uninstall(&package)?);
    Ok(())
}
