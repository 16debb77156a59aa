//! Shared HDF5 dataset and attribute helpers.

use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{s, ArrayView1};
use std::str::FromStr;

pub(crate) fn create_extendable_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    chunk_rows: usize,
    compression: Option<u8>,
    shuffle: bool,
) -> Result<Dataset> {
    let mut builder = group
        .new_dataset::<T>()
        .shape((0..,))
        .chunk((chunk_rows,));

    if let Some(level) = compression {
        builder = builder.deflate(level);
    }

    if shuffle {
        builder = builder.shuffle();
    }

    Ok(builder.create(name)?)
}

pub(crate) fn create_filled_dataset<T: H5Type>(group: &Group, name: &str, data: &[T]) -> Result<Dataset> {
    let dataset = group.new_dataset::<T>().shape((data.len(),)).create(name)?;
    if !data.is_empty() {
        dataset.write(ArrayView1::from(data))?;
    }
    Ok(dataset)
}

pub(crate) fn append_slice<T: H5Type>(dataset: &Dataset, offset: usize, data: &[T]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let new_len = offset + data.len();
    dataset.resize((new_len,))?;
    let view = ArrayView1::from(data);
    dataset.write_slice(view, s![offset..new_len])?;
    Ok(())
}

pub(crate) fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group.dataset(name).map_err(|e| {
        Error::InvalidFormat(format!("missing dataset '{name}' in {}: {e}", group.name()))
    })?;
    Ok(dataset.read_raw::<T>()?)
}

pub(crate) fn open_group(parent: &Group, name: &str) -> Result<Group> {
    parent
        .group(name)
        .map_err(|e| Error::InvalidFormat(format!("missing group '{name}' in {}: {e}", parent.name())))
}

pub(crate) fn set_dataset_units(dataset: &Dataset, units: &str) -> Result<()> {
    let value = to_var_len_unicode(units)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("units")?
        .write_scalar(&value)?;
    Ok(())
}

pub(crate) fn set_attr_str_file(file: &File, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

pub(crate) fn set_attr_str_list_file(file: &File, name: &str, values: &[String]) -> Result<()> {
    let values = values
        .iter()
        .map(|value| to_var_len_unicode(value))
        .collect::<Result<Vec<_>>>()?;
    file.new_attr::<VarLenUnicode>()
        .shape(values.len())
        .create(name)?
        .write(ArrayView1::from(values.as_slice()))?;
    Ok(())
}

pub(crate) fn set_attr_i32(group: &Group, name: &str, value: i32) -> Result<()> {
    group
        .new_attr::<i32>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

pub(crate) fn read_attr_opt<T: H5Type + Clone>(group: &Group, name: &str) -> Result<Option<T>> {
    match group.attr(name) {
        Ok(attr) => Ok(Some(attr.read_scalar::<T>()?)),
        Err(_) => Ok(None),
    }
}

pub(crate) fn read_attr_opt_string(group: &Group, name: &str) -> Result<Option<String>> {
    match group.attr(name) {
        Ok(attr) => {
            let value: VarLenUnicode = attr.read_scalar()?;
            Ok(Some(value.to_string()))
        }
        Err(_) => Ok(None),
    }
}

/// Reads a string attribute as a list; a scalar reads as one entry.
pub(crate) fn read_attr_str_list(group: &Group, name: &str) -> Result<Vec<String>> {
    match group.attr(name) {
        Ok(attr) => Ok(attr
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(ToString::to_string)
            .collect()),
        Err(_) => Ok(Vec::new()),
    }
}

/// Converts stored row offsets into `usize`, rejecting negative values.
pub(crate) fn offsets_to_usize(name: &str, values: &[i64]) -> Result<Vec<usize>> {
    values
        .iter()
        .map(|&v| {
            usize::try_from(v)
                .map_err(|_| Error::InvalidFormat(format!("{name} contains negative offset {v}")))
        })
        .collect()
}

/// Converts `usize` row offsets into the stored `i64` representation.
pub(crate) fn offset_to_i64(name: &str, value: usize) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("{name} exceeds i64 range")))
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid string attribute: {e}")))
}
