mod test_containers;
mod test_ingestion;
mod test_pem_chains;
