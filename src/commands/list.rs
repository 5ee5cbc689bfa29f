use anyhow::Result;

pub fn run() -> Result<()> {
    let manager = super::manager()?;
    for line in manager.list()? {
        println!("{}", line);
    }
    Ok(())
}
