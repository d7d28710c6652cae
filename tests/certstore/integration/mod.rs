mod test_discovery;
mod test_inventory;
mod test_management;
mod test_vault;
