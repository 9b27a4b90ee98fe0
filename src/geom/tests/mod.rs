mod test_core_basic;
